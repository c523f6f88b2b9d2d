//! Request contract of `POST /verify`.

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// `{"Image": "<reference>"}`; the lowercase `image` key is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    #[serde(rename = "Image", alias = "image")]
    pub image: String,
}

impl VerificationRequest {
    /// Decode a request body. Content type is not inspected.
    pub fn from_json(body: &[u8]) -> ServiceResult<Self> {
        serde_json::from_slice(body).map_err(|e| ServiceError::InvalidRequest {
            message: e.to_string(),
        })
    }
}
