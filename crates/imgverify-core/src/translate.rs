//! Verifier outcome to response contract.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::VerificationFailure;
use crate::verifier::VerificationOutcome;

/// Message used when the verifier reports success without any attestation.
pub const NO_MATCHING_SIGNATURES: &str = "no matching signatures";

/// Response body of `POST /verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub verified: bool,
    pub verification_message: String,
}

impl VerificationResponse {
    pub fn verified(image: &str) -> Self {
        Self {
            verified: true,
            verification_message: format!("valid signatures found for an image: {}", image),
        }
    }

    pub fn rejected(failure: VerificationFailure) -> Self {
        Self {
            verified: false,
            verification_message: failure.message,
        }
    }
}

/// Turn a verifier outcome into the response for `image`.
///
/// `image` is echoed exactly as the caller supplied it.
pub fn translate(image: &str, outcome: VerificationOutcome) -> VerificationResponse {
    let response = match outcome {
        Ok(attestations) if !attestations.is_empty() => VerificationResponse::verified(image),
        Ok(_) => VerificationResponse::rejected(VerificationFailure::new(NO_MATCHING_SIGNATURES)),
        Err(failure) => VerificationResponse::rejected(failure),
    };

    info!(
        image = %image,
        verified = response.verified,
        message = %response.verification_message,
        "verification finished"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::Attestation;

    fn attestation() -> Attestation {
        Attestation {
            docker_reference: "example.registry/app".to_string(),
            manifest_digest: format!("sha256:{}", "a".repeat(64)),
            annotations: None,
            signature: "MEUCIQ==".to_string(),
            layer_digest: format!("sha256:{}", "b".repeat(64)),
        }
    }

    #[test]
    fn test_success_echoes_original_string() {
        let response = translate("nginx", Ok(vec![attestation()]));
        assert!(response.verified);
        assert_eq!(
            response.verification_message,
            "valid signatures found for an image: nginx"
        );
    }

    #[test]
    fn test_failure_message_verbatim() {
        let response = translate(
            "example.registry/app:v1",
            Err(VerificationFailure::new("no matching signatures: bad key")),
        );
        assert!(!response.verified);
        assert_eq!(
            response.verification_message,
            "no matching signatures: bad key"
        );
    }

    #[test]
    fn test_empty_success_is_failure() {
        let response = translate("example.registry/app:v1", Ok(vec![]));
        assert!(!response.verified);
        assert_eq!(response.verification_message, NO_MATCHING_SIGNATURES);
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(VerificationResponse::verified("nginx")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "verified": true,
                "verification_message": "valid signatures found for an image: nginx"
            })
        );
    }
}
