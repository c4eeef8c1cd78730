// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the outside world on behalf of the
// other layers:
//
//   artifact_store.rs — versioned model files on disk, naming
//                       convention and "latest" discovery.
//                       Also the ModelSource the inference
//                       service loads from.
//
//   tracking.rs       — experiment tracking (local run
//                       directories or an MLflow server),
//                       selected by MLFLOW_TRACKING_URI.

/// Versioned model artifacts on disk
pub mod artifact_store;

/// Best-effort experiment tracking sinks
pub mod tracking;
