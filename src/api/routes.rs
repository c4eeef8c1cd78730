//! Route handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::api::AppState;
use crate::domain::error::ServiceError;
use crate::domain::prediction::{PredictionRequest, PredictionResponse};
use crate::ml::inferencer::HealthStatus;

/// Liveness probe. Never loads the model.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.service.health())
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    // malformed bodies and non-numeric values are input errors, not 422s
    let Json(req) = payload.map_err(|rejection| ServiceError::Inference(rejection.body_text()))?;

    let response = state.service.predict(&req).await?;
    Ok(Json(response))
}
