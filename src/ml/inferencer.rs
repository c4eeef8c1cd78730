// ============================================================
// Layer 5 — Inference Service
// ============================================================
// Owns the one model the process serves.
//
// Lifecycle of the cached handle:
//
//   UNINITIALIZED ──get_model(), artifact found──▶ READY (terminal)
//        │
//        └──get_model(), no artifact──▶ error returned, stays
//                                       UNINITIALIZED (next call retries)
//
// The handle lives in a tokio OnceCell: concurrent first callers
// are serialised by get_or_try_init, so the artifact is read at
// most once and everybody receives the same Arc. A failed
// initialisation leaves the cell empty.
//
// The initialisation runs in its own task. A caller that goes
// away mid-load (client disconnect) only stops waiting; the load
// still completes and fills the cell for the next caller.

use std::path::PathBuf;
use std::sync::Arc;

use ndarray::Array2;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::domain::error::{ArtifactError, ServiceError};
use crate::domain::prediction::{PredictionRequest, PredictionResponse};
use crate::ml::model::LogisticModel;

pub const EMPTY_REQUEST_MESSAGE: &str = "No feature rows provided.";

/// A deserialised artifact together with where it came from.
#[derive(Debug)]
pub struct LoadedModel {
    pub path:  PathBuf,
    pub model: LogisticModel,
}

/// Where the service gets its model from. Blocking; called off the
/// async workers via spawn_blocking.
pub trait ModelSource: Send + Sync + 'static {
    fn load_latest(&self) -> Result<LoadedModel, ArtifactError>;
}

/// Fixed liveness payload of GET /health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub struct InferenceService {
    source: Arc<dyn ModelSource>,
    model:  Arc<OnceCell<Arc<LoadedModel>>>,
}

impl InferenceService {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self { source, model: Arc::new(OnceCell::new()) }
    }

    /// True once a model has been loaded.
    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        self.model.initialized()
    }

    /// Liveness probe. Touches neither the model nor storage.
    pub fn health(&self) -> HealthStatus {
        HealthStatus { status: "ok" }
    }

    /// Resolve and load the latest artifact on first use; afterwards
    /// return the cached handle without touching storage.
    pub async fn get_model(&self) -> Result<Arc<LoadedModel>, ServiceError> {
        if let Some(loaded) = self.model.get() {
            return Ok(Arc::clone(loaded));
        }

        let cell   = Arc::clone(&self.model);
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            cell.get_or_try_init(|| async move {
                let loaded = tokio::task::spawn_blocking(move || source.load_latest())
                    .await
                    .map_err(|e| ServiceError::ModelUnavailable(format!("loader task failed: {e}")))??;

                tracing::info!("Loaded model from {}", loaded.path.display());
                Ok::<_, ServiceError>(Arc::new(loaded))
            })
            .await
            .cloned()
        })
        .await
        .map_err(|e| ServiceError::ModelUnavailable(format!("loader task failed: {e}")))?
    }

    /// Validate `req`, load the model if needed, and classify every row.
    pub async fn predict(&self, req: &PredictionRequest) -> Result<PredictionResponse, ServiceError> {
        validate_request(req)?;
        let loaded = self.get_model().await?;
        predict_with(&loaded.model, req)
    }
}

/// Structural checks that need no model: at least one row, no empty row.
pub fn validate_request(req: &PredictionRequest) -> Result<(), ServiceError> {
    if req.features.is_empty() {
        return Err(ServiceError::InvalidRequest(EMPTY_REQUEST_MESSAGE.to_string()));
    }
    if let Some(i) = req.features.iter().position(Vec::is_empty) {
        return Err(ServiceError::InvalidRequest(format!("Feature row {i} is empty.")));
    }
    Ok(())
}

/// Rows → `n_rows x n_features` matrix. Every row must have the
/// length of the first one.
pub fn to_matrix(rows: &[Vec<f64>]) -> Result<Array2<f64>, ServiceError> {
    let width = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(ServiceError::Inference(format!(
            "row {i} has {} features, but row 0 has {width}",
            row.len()
        )));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|e| ServiceError::Inference(e.to_string()))
}

/// Run `model` over a validated request.
pub fn predict_with(
    model: &LogisticModel,
    req:   &PredictionRequest,
) -> Result<PredictionResponse, ServiceError> {
    let x = to_matrix(&req.features)?;

    let probabilities = model
        .predict_proba(&x)
        .map_err(|e| ServiceError::Inference(e.to_string()))?;
    let predictions = model
        .predict(&x)
        .map_err(|e| ServiceError::Inference(e.to_string()))?;

    tracing::debug!("Scored {} rows", x.nrows());

    Ok(PredictionResponse {
        predictions:   predictions.iter().map(|&y| y as i64).collect(),
        probabilities: probabilities.to_vec(),
    })
}
