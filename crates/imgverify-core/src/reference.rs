//! Image reference resolution.
//!
//! Accepts the usual registry reference forms and normalizes them the way
//! container tooling does:
//! - `busybox` → `docker.io/library/busybox:latest`
//! - `ghcr.io/org/app:v1` → registry `ghcr.io`, repository `org/app`, tag `v1`
//! - `ghcr.io/org/app@sha256:...` → pinned by digest

use std::str::FromStr;

use oci_client::Reference;

use crate::error::{ServiceError, ServiceResult};

/// Tag applied when a reference names neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// A registry-qualified image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    inner: Reference,
}

impl ImageRef {
    /// Parse a user-supplied image string.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgverify_core::ImageRef;
    ///
    /// let image = ImageRef::resolve("ghcr.io/org/app:v1").unwrap();
    /// assert_eq!(image.registry(), "ghcr.io");
    /// assert_eq!(image.repository(), "org/app");
    /// assert_eq!(image.tag(), Some("v1"));
    ///
    /// assert!(ImageRef::resolve("").is_err());
    /// ```
    pub fn resolve(raw: &str) -> ServiceResult<Self> {
        if raw.trim().is_empty() {
            return Err(ServiceError::InvalidReference {
                reference: raw.to_string(),
                reason: "empty image reference".to_string(),
            });
        }

        let inner = raw
            .parse::<Reference>()
            .map_err(|e| ServiceError::InvalidReference {
                reference: raw.to_string(),
                reason: e.to_string(),
            })?;
        if let Err(reason) = check_lowercase(inner.repository()) {
            return Err(ServiceError::InvalidReference {
                reference: raw.to_string(),
                reason,
            });
        }

        Ok(Self { inner })
    }

    /// Registry host (with port, if any).
    pub fn registry(&self) -> &str {
        self.inner.registry()
    }

    /// Repository path within the registry.
    pub fn repository(&self) -> &str {
        self.inner.repository()
    }

    /// Tag, with `latest` applied when neither tag nor digest was given.
    pub fn tag(&self) -> Option<&str> {
        match (self.inner.tag(), self.inner.digest()) {
            (Some(tag), _) => Some(tag),
            (None, None) => Some(DEFAULT_TAG),
            (None, Some(_)) => None,
        }
    }

    /// Pinned digest (`sha256:...`), if any.
    pub fn digest(&self) -> Option<&str> {
        self.inner.digest()
    }

    /// The repository this image lives in.
    pub fn repository_ref(&self) -> Repository {
        Repository {
            registry: self.registry().to_string(),
            repository: self.repository().to_string(),
        }
    }

    /// Full normalized form.
    pub fn whole(&self) -> String {
        self.inner.whole()
    }

    /// Underlying OCI reference.
    pub fn as_oci(&self) -> &Reference {
        &self.inner
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner.whole())
    }
}

impl FromStr for ImageRef {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

/// A registry-qualified repository without tag or digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub registry: String,
    pub repository: String,
}

impl Repository {
    /// Parse a repository such as `ghcr.io/org/signatures`.
    pub fn parse(raw: &str) -> ServiceResult<Self> {
        let raw = raw.trim();
        let invalid = |reason: &str| ServiceError::InvalidReference {
            reference: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("empty repository"));
        }
        if raw.contains('@') {
            return Err(invalid("repository must not carry a digest"));
        }
        let last_segment = raw.rsplit('/').next().unwrap_or(raw);
        if last_segment.contains(':') {
            return Err(invalid("repository must not carry a tag"));
        }

        let reference = raw.parse::<Reference>().map_err(|e| invalid(&e.to_string()))?;
        check_lowercase(reference.repository()).map_err(|reason| invalid(&reason))?;
        Ok(Self {
            registry: reference.registry().to_string(),
            repository: reference.repository().to_string(),
        })
    }

    /// Reference to a tag inside this repository.
    pub fn tagged(&self, tag: impl Into<String>) -> Reference {
        Reference::with_tag(self.registry.clone(), self.repository.clone(), tag.into())
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)
    }
}

/// Repository paths are lowercase; the OCI parser only enforces this when a
/// registry is named explicitly.
fn check_lowercase(repository: &str) -> Result<(), String> {
    if repository.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err("repository name must be lowercase".to_string());
    }
    Ok(())
}
