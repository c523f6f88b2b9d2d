//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};
use crate::options::RegistryOptions;

/// Default trust key location, relative to the working directory.
pub const DEFAULT_KEY_FILE: &str = "cosign.pub";

/// Configuration of the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// PEM public key; relative paths resolve against the working directory.
    pub key_file: PathBuf,

    pub registry: RegistryOptions,

    /// Upper bound on one verifier call. `None` waits as long as the
    /// registry does.
    pub verify_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            registry: RegistryOptions::default(),
            verify_timeout: None,
        }
    }
}

impl ServiceConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `IMGVERIFY_KEY_FILE` | Public key path (default: `cosign.pub`) |
    /// | `IMGVERIFY_ALLOW_INSECURE` | Skip TLS certificate validation |
    /// | `IMGVERIFY_K8S_KEYCHAIN` | Use the Kubernetes keychain |
    /// | `IMGVERIFY_TAG_PREFIX` | Signature tag prefix |
    /// | `IMGVERIFY_VERIFY_TIMEOUT_SECS` | Verification timeout, `0` disables |
    pub fn from_env() -> Self {
        Self {
            key_file: std::env::var_os("IMGVERIFY_KEY_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE)),
            registry: RegistryOptions::from_env(),
            verify_timeout: std::env::var("IMGVERIFY_VERIFY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .and_then(timeout_from_secs),
        }
    }

    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = path.into();
        self
    }

    pub fn with_registry(mut self, registry: RegistryOptions) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_verify_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.verify_timeout = timeout;
        self
    }

    /// Absolute key path. Relative paths are joined onto the working
    /// directory as it is when this is called.
    pub fn key_path(&self) -> ServiceResult<PathBuf> {
        if self.key_file.is_absolute() {
            return Ok(self.key_file.clone());
        }
        let cwd = std::env::current_dir().map_err(|e| ServiceError::Config {
            message: format!("reading working directory: {}", e),
        })?;
        Ok(cwd.join(&self.key_file))
    }
}

/// `0` means no timeout.
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
