//! Container image signature verification.
//!
//! Given an image reference, decides whether the image carries a valid
//! cosign signature made with the configured public key, and reports the
//! verdict as a `{verified, verification_message}` response.
//!
//! # Quick Start
//!
//! ```no_run
//! use imgverify_core::{CosignVerifier, ImageVerifier, ServiceConfig};
//!
//! # async fn example() -> Result<(), imgverify_core::ServiceError> {
//! let service = ImageVerifier::new(ServiceConfig::from_env(), CosignVerifier::new());
//!
//! let response = service.verify_image("ghcr.io/org/app:v1").await?;
//! println!("{}: {}", response.verified, response.verification_message);
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Malformed requests and image references are client errors; a missing key
//! file or a malformed `COSIGN_REPOSITORY` is a configuration error. A
//! signature that does not verify is neither: it produces a response with
//! `verified == false`.
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `IMGVERIFY_KEY_FILE` | Public key path (default: `cosign.pub` in the working directory) |
//! | `IMGVERIFY_ALLOW_INSECURE` | Skip registry TLS certificate validation |
//! | `IMGVERIFY_K8S_KEYCHAIN` | Read registry credentials from mounted pull secrets |
//! | `IMGVERIFY_TAG_PREFIX` | Prefix for signature tags |
//! | `IMGVERIFY_VERIFY_TIMEOUT_SECS` | Verification timeout in seconds (default: none) |
//! | `COSIGN_REPOSITORY` | Repository holding signatures, read per request |

pub mod config;
pub mod cosign;
pub mod error;
pub mod keychain;
pub mod options;
pub mod policy;
pub mod reference;
pub mod request;
pub mod service;
pub mod translate;
pub mod trust;
pub mod verifier;

pub use config::ServiceConfig;
pub use cosign::{CosignError, CosignVerifier};
pub use error::{ErrorKind, ServiceError, ServiceResult, VerificationFailure};
pub use options::{build_options, ClientOptions, Keychain, RegistryOptions, RemoteOptions};
pub use policy::CheckOpts;
pub use reference::{ImageRef, Repository};
pub use request::VerificationRequest;
pub use service::ImageVerifier;
pub use translate::{translate, VerificationResponse};
pub use trust::{fulcio_roots, load_public_key, PublicKey, RootCertificates};
pub use verifier::{Attestation, VerificationOutcome, Verifier};
