// ============================================================
// Layer 1b — HTTP API
// ============================================================
// The network face of the service (axum):
//
//   GET  /health   → {"status": "ok"}            (never loads the model)
//   POST /predict  → {"predictions", "probabilities"}
//
//   routes.rs — handlers
//   error.rs  — ServiceError → status code + {"detail"} body

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::ml::inferencer::InferenceService;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InferenceService>,
}

pub fn router(service: Arc<InferenceService>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/predict", post(routes::predict))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}
