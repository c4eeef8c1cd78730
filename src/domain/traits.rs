// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training workflow only ever talks to these traits, so the
// demo dataset can be swapped for a CSV file and the local
// tracking directory for an MLflow server without touching it.

use crate::data::dataset::Dataset;
use crate::domain::error::{DataUnavailableError, TrackingSinkError};

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can produce the fixed-schema training table.
///
/// Implementations:
///   - DemoDataset → seeded built-in dataset
///   - CsvDataset  → header row, label in the last column
pub trait DatasetSource {
    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    /// Load features and labels. Deterministic for a given source.
    fn load(&self) -> Result<Dataset, DataUnavailableError>;
}

// ─── TrackingSink ─────────────────────────────────────────────────────────────
/// Everything recorded about one training run.
#[derive(Debug, Clone)]
pub struct TrackingRun<'a> {
    pub experiment: &'a str,
    pub run_name:   &'a str,
    pub params:     Vec<(&'static str, String)>,
    pub metrics:    Vec<(&'static str, f64)>,
    /// Serialised model snapshot.
    pub model:      serde_json::Value,
}

/// External experiment tracker. Never required for serving.
///
/// Implementations:
///   - LocalTrackingSink  → run directories under a local root
///   - MlflowTrackingSink → MLflow REST API
pub trait TrackingSink {
    /// Record a run and return its identifier.
    fn log_run(&self, run: &TrackingRun<'_>) -> Result<String, TrackingSinkError>;
}
