//! The verification pipeline.
//!
//! ```text
//! body ──▶ request ──▶ reference ──▶ trust key ──▶ options ──▶ policy ──▶ verifier ──▶ translate
//! ```
//!
//! Nothing is cached between calls: the key file, the signature-repository
//! override and the policy are rebuilt for every request.

use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{ServiceResult, VerificationFailure};
use crate::options::build_options;
use crate::policy::CheckOpts;
use crate::reference::ImageRef;
use crate::request::VerificationRequest;
use crate::translate::{translate, VerificationResponse};
use crate::trust::load_public_key;
use crate::verifier::Verifier;

/// Runs the pipeline for each request with one configuration and verifier.
#[derive(Debug, Clone)]
pub struct ImageVerifier<V> {
    config: ServiceConfig,
    verifier: V,
}

impl<V: Verifier> ImageVerifier<V> {
    pub fn new(config: ServiceConfig, verifier: V) -> Self {
        Self { config, verifier }
    }

    /// Decode a raw `POST /verify` body and verify the image it names.
    pub async fn verify_request(&self, body: &[u8]) -> ServiceResult<VerificationResponse> {
        let request = VerificationRequest::from_json(body).map_err(|e| {
            warn!(error = %e, "rejecting request");
            e
        })?;
        self.verify_image(&request.image).await
    }

    /// Verify one image string.
    ///
    /// `Err` means the request could not be evaluated (bad input or
    /// misconfiguration). A failed verification is `Ok` with
    /// `verified == false`.
    pub async fn verify_image(&self, image: &str) -> ServiceResult<VerificationResponse> {
        self.run(image).await.map_err(|e| {
            warn!(image = %image, error = %e, "verification request failed");
            e
        })
    }

    async fn run(&self, image: &str) -> ServiceResult<VerificationResponse> {
        let reference = ImageRef::resolve(image)?;

        let key_path = self.config.key_path()?;
        let key = load_public_key(&key_path)?;

        let options = build_options(&self.config.registry)?;
        let policy = CheckOpts::assemble(key);

        debug!(
            image = %image,
            reference = %reference,
            key = key_path.display().to_string(),
            algorithm = policy.key().algorithm(),
            "verifying image"
        );

        let call = self.verifier.verify(&reference, &policy, &options);
        let outcome = match self.config.verify_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => Err(VerificationFailure::new(format!(
                    "verification timed out after {}s",
                    limit.as_secs_f64()
                ))),
            },
            None => call.await,
        };

        Ok(translate(image, outcome))
    }
}
