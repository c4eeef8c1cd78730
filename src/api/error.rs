// ============================================================
// Layer 1b — HTTP Error Mapping
// ============================================================
// ServiceError → status code + `{"detail": "..."}` body.
//
//   InvalidRequest, Inference → 400
//   ModelUnavailable          → 503
//   CorruptArtifact           → 500
//
// Clients only ever see `public_message()`; the full error,
// including artifact paths, goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::ServiceError;

pub fn status_of(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::InvalidRequest(_) | ServiceError::Inference(_) => StatusCode::BAD_REQUEST,
        ServiceError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::CorruptArtifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        if self.is_client_error() {
            tracing::debug!("Rejected request: {}", self);
        } else {
            tracing::error!("{}", self);
        }
        (status, Json(json!({ "detail": self.public_message() }))).into_response()
    }
}
