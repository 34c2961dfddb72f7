//! Mapping from service errors onto HTTP responses.
//!
//! Every error leaves the API wrapped in the standard envelope. Unexpected
//! failures (database, hashing) become a generic 500; their detail is only
//! included when the process runs in development mode.

use std::sync::OnceLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use api_shared::Envelope;
use bidanku_core::ServiceError;

/// Whether 500 responses include error detail. Set once when the router is
/// built; defaults to hiding detail.
static DEVELOPMENT: OnceLock<bool> = OnceLock::new();

pub(crate) fn set_development(enabled: bool) {
    let _ = DEVELOPMENT.set(enabled);
}

fn development() -> bool {
    *DEVELOPMENT.get().unwrap_or(&false)
}

#[derive(Debug)]
pub enum ApiError {
    /// A domain error with its own status mapping.
    Service(ServiceError),
    /// Missing or invalid bearer token.
    Unauthorized(String),
    /// Authenticated but not allowed (e.g. reset-token user mismatch).
    Forbidden(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Envelope::fail(message, None),
            ),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, Envelope::fail(message, None)),
            ApiError::Service(err) => match err {
                ServiceError::Validation(fields) => (
                    StatusCode::BAD_REQUEST,
                    Envelope::fail(
                        "Validasi gagal",
                        serde_json::to_value(&fields).ok(),
                    ),
                ),
                ServiceError::Conflict(detail) => (
                    StatusCode::BAD_REQUEST,
                    Envelope::fail(format!("Data duplikat: {detail}"), None),
                ),
                ServiceError::Unauthorized(message) => {
                    (StatusCode::UNAUTHORIZED, Envelope::fail(message, None))
                }
                ServiceError::NotFound(what) => (
                    StatusCode::NOT_FOUND,
                    Envelope::fail(format!("Data {what} tidak ditemukan"), None),
                ),
                err @ (ServiceError::Database(_) | ServiceError::Hash(_)) => {
                    tracing::error!(error = %err, "internal error");
                    let message = if development() {
                        format!("Terjadi kesalahan pada server: {err}")
                    } else {
                        "Terjadi kesalahan pada server".to_string()
                    };
                    (StatusCode::INTERNAL_SERVER_ERROR, Envelope::fail(message, None))
                }
            },
        };

        (status, Json(body)).into_response()
    }
}
