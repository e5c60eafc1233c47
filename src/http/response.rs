//! Response handling and failure translation.
//!
//! # Responsibilities
//! - Map gateway errors to status codes and JSON bodies
//! - Never expose transport error text to clients
//!
//! # Design Decisions
//! - Every client-visible failure is `{"error": "..."}`
//! - Upstream failures are always 503, whatever the transport cause
//! - Upstream responses themselves are streamed through untouched

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Structured error body returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Map a request failure to its client-facing status and body.
pub fn translate(err: &GatewayError) -> (StatusCode, ErrorBody) {
    match err {
        GatewayError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("API endpoint not found"),
        ),
        GatewayError::Upstream { label, .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody::new(format!("{} service unavailable", label)),
        ),
        GatewayError::PayloadTooLarge { .. } => (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorBody::new("Request body too large"),
        ),
        GatewayError::BadRequest(_) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("Invalid request body"),
        ),
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = translate(&self);
        (status, Json(body)).into_response()
    }
}
