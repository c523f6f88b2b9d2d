//! Registry-backed [`Verifier`] for cosign simple signatures.
//!
//! Cosign stores the signatures of an image `repo@sha256:<hex>` as a separate
//! OCI artifact tagged `sha256-<hex>.sig`, one layer per signature. Each layer
//! is a simple-signing JSON payload and carries its base64 signature in the
//! `dev.cosignproject.cosign/signature` annotation.

mod simple_signing;
mod transport;

pub use simple_signing::{SimpleSigning, SIGNATURE_ANNOTATION, SIMPLE_SIGNING_MEDIA_TYPE};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use oci_client::client::ImageLayer;
use oci_client::secrets::RegistryAuth;
use oci_client::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::VerificationFailure;
use crate::keychain;
use crate::options::ClientOptions;
use crate::policy::CheckOpts;
use crate::reference::ImageRef;
use crate::verifier::{Attestation, VerificationOutcome, Verifier};

/// Why a cosign verification failed.
#[derive(Debug, thiserror::Error)]
pub enum CosignError {
    #[error("resolving registry credentials: {0}")]
    Credentials(String),

    #[error("fetching manifest digest for {reference}: {message}")]
    ManifestDigest { reference: String, message: String },

    #[error("fetching signatures from {reference}: {message}")]
    SignatureFetch { reference: String, message: String },

    #[error("no signatures found for image {image}")]
    NoSignatures { image: String },

    #[error("layer {layer} has no dev.cosignproject.cosign/signature annotation")]
    MissingSignature { layer: String },

    #[error("layer {layer} has a malformed signature: {message}")]
    MalformedSignature { layer: String, message: String },

    #[error("signature on layer {layer} does not match the key: {message}")]
    SignatureMismatch { layer: String, message: String },

    #[error("invalid signature payload: {0}")]
    InvalidPayload(String),

    #[error("invalid or missing digest in claim: {actual} (expected {expected})")]
    ClaimsMismatch { expected: String, actual: String },

    #[error("no matching signatures: {}", .reasons.join("; "))]
    NoMatchingSignatures { reasons: Vec<String> },
}

impl From<CosignError> for VerificationFailure {
    fn from(err: CosignError) -> Self {
        VerificationFailure::new(err.to_string())
    }
}

/// Verifies cosign signatures stored next to the image in its registry.
#[derive(Debug, Clone, Default)]
pub struct CosignVerifier {
    _private: (),
}

impl CosignVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify `reference`, returning the payloads of all valid signatures.
    pub async fn verify_signatures(
        &self,
        reference: &ImageRef,
        policy: &CheckOpts,
        options: &ClientOptions,
    ) -> Result<Vec<Attestation>, CosignError> {
        let sig_repo = options.signature_repository(reference);
        let client =
            transport::registry_client(options, &[reference.registry(), &sig_repo.registry]);

        let image_auth = registry_auth(options, reference.registry())?;
        let digest = match reference.digest() {
            Some(digest) => digest.to_string(),
            None => client
                .fetch_manifest_digest(reference.as_oci(), &image_auth)
                .await
                .map_err(|e| CosignError::ManifestDigest {
                    reference: reference.whole(),
                    message: e.to_string(),
                })?,
        };

        let sig_ref = sig_repo.tagged(options.signature_tag(&digest));
        let sig_auth = if sig_repo.registry == reference.registry() {
            image_auth
        } else {
            registry_auth(options, &sig_repo.registry)?
        };

        debug!(
            image = %reference,
            digest = %digest,
            signatures = %sig_ref,
            "fetching signatures"
        );

        let layers = fetch_signature_layers(&client, &sig_ref, &sig_auth).await?;
        if layers.is_empty() {
            return Err(CosignError::NoSignatures {
                image: reference.whole(),
            });
        }

        let mut attestations = Vec::new();
        let mut reasons = Vec::new();
        for layer in &layers {
            match verify_layer(layer, &digest, policy) {
                Ok(attestation) => attestations.push(attestation),
                Err(e) => {
                    debug!(image = %reference, error = %e, "signature rejected");
                    reasons.push(e.to_string());
                }
            }
        }

        if attestations.is_empty() {
            return Err(CosignError::NoMatchingSignatures { reasons });
        }
        Ok(attestations)
    }
}

#[async_trait]
impl Verifier for CosignVerifier {
    async fn verify(
        &self,
        reference: &ImageRef,
        policy: &CheckOpts,
        options: &ClientOptions,
    ) -> VerificationOutcome {
        self.verify_signatures(reference, policy, options)
            .await
            .map_err(|e| {
                warn!(image = %reference, error = %e, "cosign verification failed");
                VerificationFailure::from(e)
            })
    }
}

fn registry_auth(options: &ClientOptions, registry: &str) -> Result<RegistryAuth, CosignError> {
    keychain::resolve_auth(options.remote.keychain, registry)
        .map_err(|e| CosignError::Credentials(e.to_string()))
}

async fn fetch_signature_layers(
    client: &Client,
    sig_ref: &oci_client::Reference,
    auth: &RegistryAuth,
) -> Result<Vec<ImageLayer>, CosignError> {
    let image = client
        .pull(sig_ref, auth, vec![SIMPLE_SIGNING_MEDIA_TYPE])
        .await
        .map_err(|e| CosignError::SignatureFetch {
            reference: sig_ref.whole(),
            message: e.to_string(),
        })?;
    Ok(image.layers)
}

/// Check one signature layer against the policy.
fn verify_layer(
    layer: &ImageLayer,
    image_digest: &str,
    policy: &CheckOpts,
) -> Result<Attestation, CosignError> {
    let layer_digest = format!("sha256:{}", hex::encode(Sha256::digest(&layer.data)));

    let encoded = layer
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(SIGNATURE_ANNOTATION))
        .ok_or_else(|| CosignError::MissingSignature {
            layer: layer_digest.clone(),
        })?;

    let signature = BASE64
        .decode(encoded.trim())
        .map_err(|e| CosignError::MalformedSignature {
            layer: layer_digest.clone(),
            message: e.to_string(),
        })?;

    policy
        .key()
        .verify(&layer.data, &signature)
        .map_err(|message| CosignError::SignatureMismatch {
            layer: layer_digest.clone(),
            message,
        })?;

    let payload = SimpleSigning::from_slice(&layer.data)?;
    if policy.claims() {
        payload.check_claims(image_digest)?;
    }

    Ok(Attestation {
        docker_reference: payload.critical.identity.docker_reference,
        manifest_digest: payload.critical.image.docker_manifest_digest,
        annotations: payload.optional,
        signature: encoded.clone(),
        layer_digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::PublicKey;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::{Signature, SigningKey};
    use pkcs8::{EncodePublicKey, LineEnding};
    use std::collections::BTreeMap;

    const IMAGE_DIGEST: &str =
        "sha256:4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    fn keypair() -> (SigningKey, CheckOpts) {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let pem = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        let policy = CheckOpts::assemble(PublicKey::from_pem(&pem).unwrap());
        (signing_key, policy)
    }

    fn payload(digest: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "critical": {
                "identity": {"docker-reference": "example.registry/app"},
                "image": {"docker-manifest-digest": digest},
                "type": "cosign container image signature"
            },
            "optional": null
        }))
        .unwrap()
    }

    fn signed_layer(key: &SigningKey, data: Vec<u8>) -> ImageLayer {
        let signature: Signature = key.sign(&data);
        let mut annotations = BTreeMap::new();
        annotations.insert(
            SIGNATURE_ANNOTATION.to_string(),
            BASE64.encode(signature.to_der().as_bytes()),
        );
        ImageLayer::new(data, SIMPLE_SIGNING_MEDIA_TYPE.to_string(), Some(annotations))
    }

    #[test]
    fn test_valid_layer() {
        let (key, policy) = keypair();
        let layer = signed_layer(&key, payload(IMAGE_DIGEST));

        let attestation = verify_layer(&layer, IMAGE_DIGEST, &policy).unwrap();
        assert_eq!(attestation.manifest_digest, IMAGE_DIGEST);
        assert_eq!(attestation.docker_reference, "example.registry/app");
        assert!(attestation.layer_digest.starts_with("sha256:"));
    }

    #[test]
    fn test_wrong_key() {
        let (signer, _) = keypair();
        let (_, other_policy) = keypair();
        let layer = signed_layer(&signer, payload(IMAGE_DIGEST));

        assert!(matches!(
            verify_layer(&layer, IMAGE_DIGEST, &other_policy),
            Err(CosignError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn test_claims_mismatch() {
        let (key, policy) = keypair();
        let other = format!("sha256:{}", "0".repeat(64));
        let layer = signed_layer(&key, payload(&other));

        assert!(matches!(
            verify_layer(&layer, IMAGE_DIGEST, &policy),
            Err(CosignError::ClaimsMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_annotation() {
        let (_, policy) = keypair();
        let layer = ImageLayer::new(
            payload(IMAGE_DIGEST),
            SIMPLE_SIGNING_MEDIA_TYPE.to_string(),
            None,
        );

        assert!(matches!(
            verify_layer(&layer, IMAGE_DIGEST, &policy),
            Err(CosignError::MissingSignature { .. })
        ));
    }

    #[test]
    fn test_malformed_signature() {
        let (_, policy) = keypair();
        let mut annotations = BTreeMap::new();
        annotations.insert(SIGNATURE_ANNOTATION.to_string(), "%%%".to_string());
        let layer = ImageLayer::new(
            payload(IMAGE_DIGEST),
            SIMPLE_SIGNING_MEDIA_TYPE.to_string(),
            Some(annotations),
        );

        assert!(matches!(
            verify_layer(&layer, IMAGE_DIGEST, &policy),
            Err(CosignError::MalformedSignature { .. })
        ));
    }

    #[test]
    fn test_no_matching_message() {
        let err = CosignError::NoMatchingSignatures {
            reasons: vec!["first".to_string(), "second".to_string()],
        };
        let failure = VerificationFailure::from(err);
        assert_eq!(failure.message, "no matching signatures: first; second");
    }
}
