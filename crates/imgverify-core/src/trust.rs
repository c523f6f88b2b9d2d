//! Trust material: the verifying key and the compiled-in root certificates.
//!
//! The key is read from disk on every call so that a rotated key file is
//! picked up without a restart. The root certificates are fixed at build
//! time and parsed once per process.

use std::path::Path;
use std::sync::OnceLock;

use pkcs8::DecodePublicKey;

use crate::error::{ServiceError, ServiceResult};

/// Sigstore public-good Fulcio root certificates.
const FULCIO_ROOTS_PEM: &str = include_str!("../certs/fulcio_roots.pem");

static FULCIO_ROOTS: OnceLock<RootCertificates> = OnceLock::new();

/// A public key able to check cosign signatures.
#[derive(Debug, Clone)]
pub enum PublicKey {
    /// ECDSA P-256, the key type `cosign generate-key-pair` produces.
    EcdsaP256(p256::ecdsa::VerifyingKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

impl PublicKey {
    /// Parse a PEM-encoded SubjectPublicKeyInfo.
    pub fn from_pem(pem: &str) -> Result<Self, String> {
        if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_pem(pem) {
            return Ok(Self::EcdsaP256(key));
        }
        match ed25519_dalek::VerifyingKey::from_public_key_pem(pem) {
            Ok(key) => Ok(Self::Ed25519(key)),
            Err(e) => Err(format!("unsupported or malformed public key: {}", e)),
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::EcdsaP256(_) => "ecdsa-p256-sha256",
            Self::Ed25519(_) => "ed25519",
        }
    }

    /// Check `signature` over `message`.
    ///
    /// ECDSA signatures are ASN.1 DER; Ed25519 signatures are 64 raw bytes.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), String> {
        match self {
            Self::EcdsaP256(key) => {
                use p256::ecdsa::signature::Verifier;

                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|e| format!("invalid ecdsa signature encoding: {}", e))?;
                key.verify(message, &signature)
                    .map_err(|_| "ecdsa signature does not match".to_string())
            }
            Self::Ed25519(key) => {
                use ed25519_dalek::Verifier;

                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| format!("invalid ed25519 signature bytes: {}", e))?;
                key.verify(message, &signature)
                    .map_err(|_| "ed25519 signature does not match".to_string())
            }
        }
    }
}

/// Load the verifying key from `path`.
pub fn load_public_key(path: &Path) -> ServiceResult<PublicKey> {
    let key_error = |message: String| ServiceError::KeyLoad {
        path: path.display().to_string(),
        message,
    };

    let pem = std::fs::read_to_string(path).map_err(|e| key_error(e.to_string()))?;
    let key = PublicKey::from_pem(&pem).map_err(key_error)?;

    tracing::debug!(path = %path.display(), algorithm = key.algorithm(), "loaded public key");
    Ok(key)
}

/// A fixed set of DER-encoded root certificates.
#[derive(Debug, Clone)]
pub struct RootCertificates {
    der: Vec<Vec<u8>>,
}

impl RootCertificates {
    fn from_pem_bundle(bundle: &str) -> Result<Self, pem::PemError> {
        let der = pem::parse_many(bundle)?
            .into_iter()
            .filter(|block| block.tag() == "CERTIFICATE")
            .map(|block| block.into_contents())
            .collect();
        Ok(Self { der })
    }

    pub fn certificates(&self) -> &[Vec<u8>] {
        &self.der
    }

    pub fn len(&self) -> usize {
        self.der.len()
    }

    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }
}

/// The compiled-in Fulcio roots, parsed on first use.
pub fn fulcio_roots() -> &'static RootCertificates {
    FULCIO_ROOTS.get_or_init(|| {
        RootCertificates::from_pem_bundle(FULCIO_ROOTS_PEM)
            .expect("compiled-in Fulcio root bundle must be valid PEM")
    })
}
