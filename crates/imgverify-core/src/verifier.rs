//! The verification capability consumed by the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VerificationFailure;
use crate::options::ClientOptions;
use crate::policy::CheckOpts;
use crate::reference::ImageRef;

/// A signature that validated against the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// `critical.identity.docker-reference` from the signed payload.
    pub docker_reference: String,

    /// `critical.image.docker-manifest-digest` from the signed payload.
    pub manifest_digest: String,

    /// Unsigned-by-convention annotations from the payload.
    #[serde(default)]
    pub annotations: Option<serde_json::Value>,

    /// Base64 signature as stored in the registry.
    pub signature: String,

    /// Digest of the signature layer.
    pub layer_digest: String,
}

/// Non-empty attestations, or the single reason verification failed.
pub type VerificationOutcome = Result<Vec<Attestation>, VerificationFailure>;

/// Checks that an image carries a valid signature under a policy.
///
/// Implementations report every kind of failure (network, missing signature,
/// key or claims mismatch) as one [`VerificationFailure`].
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        reference: &ImageRef,
        policy: &CheckOpts,
        options: &ClientOptions,
    ) -> VerificationOutcome;
}

#[async_trait]
impl<V: Verifier + ?Sized> Verifier for std::sync::Arc<V> {
    async fn verify(
        &self,
        reference: &ImageRef,
        policy: &CheckOpts,
        options: &ClientOptions,
    ) -> VerificationOutcome {
        (**self).verify(reference, policy, options).await
    }
}
