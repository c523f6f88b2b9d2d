//! Registry client options.
//!
//! Static process configuration ([`RegistryOptions`]) plus the
//! signature-repository override from the environment are combined into the
//! [`ClientOptions`] that decide how the verifier reaches the registry.

use crate::error::{ServiceError, ServiceResult};
use crate::reference::{ImageRef, Repository};

/// Environment variable redirecting signature lookups to another repository.
pub const TARGET_REPOSITORY_ENV: &str = "COSIGN_REPOSITORY";

/// Static registry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Skip TLS certificate validation when talking to registries.
    pub allow_insecure: bool,

    /// Resolve registry credentials from the cluster's pull secrets.
    pub kubernetes_keychain: bool,

    /// Prefix prepended to signature tags (air-gapped mirrors).
    pub tag_prefix: String,
}

impl RegistryOptions {
    /// Create options from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `IMGVERIFY_ALLOW_INSECURE` | Skip TLS certificate validation |
    /// | `IMGVERIFY_K8S_KEYCHAIN` | Use the Kubernetes keychain |
    /// | `IMGVERIFY_TAG_PREFIX` | Signature tag prefix |
    pub fn from_env() -> Self {
        Self {
            allow_insecure: env_flag("IMGVERIFY_ALLOW_INSECURE"),
            kubernetes_keychain: env_flag("IMGVERIFY_K8S_KEYCHAIN"),
            tag_prefix: std::env::var("IMGVERIFY_TAG_PREFIX").unwrap_or_default(),
        }
    }

    pub fn with_allow_insecure(mut self, allow: bool) -> Self {
        self.allow_insecure = allow;
        self
    }

    pub fn with_kubernetes_keychain(mut self, enabled: bool) -> Self {
        self.kubernetes_keychain = enabled;
        self
    }

    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Where registry credentials come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Keychain {
    #[default]
    Anonymous,
    /// Pull secrets mounted as a docker config file.
    Kubernetes,
}

/// Transport-level options, always present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOptions {
    pub allow_insecure: bool,
    pub keychain: Keychain,
}

/// Options for one verification attempt. Not mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    pub remote: RemoteOptions,

    /// Rewrites signature tags to `<prefix>sha256-<hex>.sig`.
    pub tag_prefix: Option<String>,

    /// Repository holding signatures; overrides the image's own repository.
    pub target_repository: Option<Repository>,
}

impl ClientOptions {
    /// Repository the signature artifact is looked up in.
    pub fn signature_repository(&self, image: &ImageRef) -> Repository {
        match &self.target_repository {
            Some(repo) => repo.clone(),
            None => image.repository_ref(),
        }
    }

    /// Tag of the signature artifact for an image digest.
    pub fn signature_tag(&self, digest: &str) -> String {
        format!(
            "{}{}.sig",
            self.tag_prefix.as_deref().unwrap_or(""),
            digest.replace(':', "-")
        )
    }
}

/// Build client options from configuration and the current environment.
///
/// A malformed `COSIGN_REPOSITORY` is a deployment error and fails the call.
pub fn build_options(cfg: &RegistryOptions) -> ServiceResult<ClientOptions> {
    let override_value = std::env::var(TARGET_REPOSITORY_ENV).ok();
    build_options_with(cfg, override_value.as_deref())
}

/// [`build_options`] with the override value supplied by the caller.
pub fn build_options_with(
    cfg: &RegistryOptions,
    override_value: Option<&str>,
) -> ServiceResult<ClientOptions> {
    let remote = RemoteOptions {
        allow_insecure: cfg.allow_insecure,
        keychain: if cfg.kubernetes_keychain {
            Keychain::Kubernetes
        } else {
            Keychain::Anonymous
        },
    };

    let tag_prefix = (!cfg.tag_prefix.is_empty()).then(|| cfg.tag_prefix.clone());

    let target_repository = match override_value.map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(Repository::parse(value).map_err(|e| ServiceError::Config {
            message: format!("parsing {}: {}", TARGET_REPOSITORY_ENV, e),
        })?),
    };

    Ok(ClientOptions {
        remote,
        tag_prefix,
        target_repository,
    })
}
