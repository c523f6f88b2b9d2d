//! Routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use imgverify_core::{ErrorKind, ImageVerifier, ServiceError, Verifier};
use tower_http::trace::TraceLayer;

/// Router serving `service`.
pub fn router<V>(service: Arc<ImageVerifier<V>>) -> Router
where
    V: Verifier + 'static,
{
    Router::new()
        .route("/verify", post(verify::<V>))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// The body is decoded as JSON whatever its content type.
async fn verify<V>(State(service): State<Arc<ImageVerifier<V>>>, body: Bytes) -> Response
where
    V: Verifier + 'static,
{
    match service.verify_request(&body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

fn error_response(err: &ServiceError) -> Response {
    let status = match err.kind() {
        ErrorKind::ClientInput => StatusCode::BAD_REQUEST,
        ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}
