//! Error types for the verification pipeline.

/// Pipeline errors.
///
/// A failed signature check is not one of these: it is reported through
/// [`VerificationFailure`] and ends up as a `verified=false` response.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request body is not JSON or lacks the image field.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Image string does not follow the registry reference grammar.
    #[error("invalid image reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Trust key missing, unreadable or not a public key.
    #[error("failed to load public key from {path}: {message}")]
    KeyLoad { path: String, message: String },

    /// Deployment misconfiguration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Who is at fault for a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something malformed (4xx).
    ClientInput,
    /// The service is misconfigured (5xx).
    Configuration,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::ClientInput,
            Self::InvalidReference { .. } => ErrorKind::ClientInput,

            Self::KeyLoad { .. } => ErrorKind::Configuration,
            Self::Config { .. } => ErrorKind::Configuration,
        }
    }

    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::ClientInput
    }
}

/// Result type for pipeline operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// The verifier ran and did not validate the image.
///
/// Network errors, missing signatures, key mismatches and claim mismatches
/// all collapse into this single message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct VerificationFailure {
    pub message: String,
}

impl VerificationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
