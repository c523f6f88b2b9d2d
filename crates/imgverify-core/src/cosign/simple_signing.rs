//! Cosign simple-signing payloads.
//!
//! ```json
//! {
//!   "critical": {
//!     "identity": { "docker-reference": "ghcr.io/org/app" },
//!     "image": { "docker-manifest-digest": "sha256:..." },
//!     "type": "cosign container image signature"
//!   },
//!   "optional": { "creator": "ci" }
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::CosignError;

/// Media type of signature layers.
pub const SIMPLE_SIGNING_MEDIA_TYPE: &str = "application/vnd.dev.cosign.simplesigning.v1+json";

/// Layer annotation holding the base64 signature over the layer bytes.
pub const SIGNATURE_ANNOTATION: &str = "dev.cosignproject.cosign/signature";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleSigning {
    pub critical: Critical,

    #[serde(default)]
    pub optional: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Critical {
    pub identity: Identity,

    pub image: Image,

    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "docker-reference")]
    pub docker_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    #[serde(rename = "docker-manifest-digest")]
    pub docker_manifest_digest: String,
}

impl SimpleSigning {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CosignError> {
        serde_json::from_slice(bytes).map_err(|e| CosignError::InvalidPayload(e.to_string()))
    }

    /// The signed digest must be the digest of the image being verified.
    pub fn check_claims(&self, image_digest: &str) -> Result<(), CosignError> {
        let claimed = &self.critical.image.docker_manifest_digest;
        if claimed != image_digest {
            return Err(CosignError::ClaimsMismatch {
                expected: image_digest.to_string(),
                actual: claimed.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "critical": {
            "identity": {"docker-reference": "example.registry/app"},
            "image": {"docker-manifest-digest": "sha256:1111111111111111111111111111111111111111111111111111111111111111"},
            "type": "cosign container image signature"
        },
        "optional": {"creator": "ci"}
    }"#;

    #[test]
    fn test_parse() {
        let payload = SimpleSigning::from_slice(PAYLOAD.as_bytes()).unwrap();
        assert_eq!(payload.critical.identity.docker_reference, "example.registry/app");
        assert_eq!(payload.critical.kind, "cosign container image signature");
        assert_eq!(
            payload.optional,
            Some(serde_json::json!({"creator": "ci"}))
        );
    }

    #[test]
    fn test_parse_without_optional() {
        let payload = SimpleSigning::from_slice(
            br#"{"critical":{"identity":{"docker-reference":"r"},"image":{"docker-manifest-digest":"sha256:00"},"type":"t"},"optional":null}"#,
        )
        .unwrap();
        assert!(payload.optional.is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            SimpleSigning::from_slice(b"not json"),
            Err(CosignError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_claims() {
        let payload = SimpleSigning::from_slice(PAYLOAD.as_bytes()).unwrap();
        let digest = format!("sha256:{}", "1".repeat(64));
        assert!(payload.check_claims(&digest).is_ok());

        let other = format!("sha256:{}", "2".repeat(64));
        assert!(matches!(
            payload.check_claims(&other),
            Err(CosignError::ClaimsMismatch { .. })
        ));
    }
}
