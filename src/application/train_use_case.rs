// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run, producing one model version:
//
//   Step 1: Validate TrainConfig             (fail fast, ConfigError)
//   Step 2: Load the dataset                 (Layer 4 - data)
//   Step 3: Stratified train/test split      (Layer 4 - data)
//   Step 4: Fit + evaluate                   (Layer 5 - ml)
//   Step 5: Log run to the tracking sink     (Layer 6 - infra, best-effort)
//   Step 6: Save the versioned artifact      (Layer 6 - infra)
//
// Step 5 sits inside its own failure boundary: an error there is
// logged and the run continues. Step 6 has none; if the artifact
// cannot be written the run fails.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::splitter::stratified_split;
use crate::domain::error::{ConfigError, TrainError};
use crate::domain::traits::{DatasetSource, TrackingRun, TrackingSink};
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::evaluation::EvalMetrics;
use crate::ml::model::{LogisticModel, SOLVER};
use crate::ml::trainer::run_training;

pub const DEFAULT_EXPERIMENT: &str = "nimbusops-breast-cancer";
pub const RUN_NAME:           &str = "logreg-baseline";

// ─── Training Configuration ──────────────────────────────────────────────────
// Created once per run and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Fraction of each class held out for evaluation, in (0, 1)
    pub test_size:    f64,
    /// Seed of the train/test split
    pub random_state: u64,
    /// Upper bound on solver iterations
    pub max_iter:     u64,
    /// Inverse regularisation strength
    #[serde(rename = "C")]
    pub c:            f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_size:    0.2,
            random_state: 42,
            max_iter:     1000,
            c:            1.0,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigError::TestSize(self.test_size));
        }
        if self.max_iter == 0 {
            return Err(ConfigError::MaxIter(self.max_iter));
        }
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ConfigError::InverseRegularization(self.c));
        }
        Ok(())
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub artifact_path: PathBuf,
    pub metrics:       EvalMetrics,
    /// `None` when the tracking sink failed
    pub run_id:        Option<String>,
    pub model:         LogisticModel,
    pub started_at:    DateTime<Utc>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:     TrainConfig,
    source:     Box<dyn DatasetSource>,
    store:      ArtifactStore,
    tracking:   Box<dyn TrackingSink>,
    experiment: String,
}

impl TrainUseCase {
    pub fn new(
        config:   TrainConfig,
        source:   Box<dyn DatasetSource>,
        store:    ArtifactStore,
        tracking: Box<dyn TrackingSink>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            tracking,
            experiment: DEFAULT_EXPERIMENT.to_string(),
        }
    }

    pub fn with_experiment(mut self, experiment: impl Into<String>) -> Self {
        self.experiment = experiment.into();
        self
    }

    /// Run the whole pipeline. On success a new artifact exists on disk.
    pub fn execute(&self) -> Result<TrainOutcome, TrainError> {
        let cfg        = &self.config;
        let started_at = Utc::now();

        // ── Step 1: Validate ─────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load data ────────────────────────────────────────────────
        tracing::info!("Loading {}", self.source.describe());
        let data = self.source.load()?;
        let [neg, pos] = data.class_counts();
        tracing::info!(
            "Dataset: {} rows x {} features ({} negative / {} positive)",
            data.n_samples(),
            data.n_features(),
            neg,
            pos,
        );

        // ── Step 3: Stratified split ─────────────────────────────────────────
        let (train, test) = stratified_split(&data, cfg.test_size, cfg.random_state);
        tracing::info!("Split: {} train, {} test", train.n_samples(), test.n_samples());

        // ── Step 4: Fit + evaluate ───────────────────────────────────────────
        let (model, metrics) = run_training(cfg, &train, &test)?;

        // ── Step 5: Tracking (best-effort) ───────────────────────────────────
        let run_id = self.track(&model, &metrics);

        // ── Step 6: Persist artifact ─────────────────────────────────────────
        let artifact_path = self.store.save(&model, Utc::now())?;

        Ok(TrainOutcome { artifact_path, metrics, run_id, model, started_at })
    }

    /// Send params, metrics and the model to the tracking sink.
    /// Failures are logged and swallowed.
    fn track(&self, model: &LogisticModel, metrics: &EvalMetrics) -> Option<String> {
        let cfg = &self.config;

        let snapshot = match serde_json::to_value(model) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Could not serialise model for tracking: {}", e);
                return None;
            }
        };

        let run = TrackingRun {
            experiment: &self.experiment,
            run_name:   RUN_NAME,
            params: vec![
                ("test_size", cfg.test_size.to_string()),
                ("random_state", cfg.random_state.to_string()),
                ("max_iter", cfg.max_iter.to_string()),
                ("C", cfg.c.to_string()),
                ("solver", SOLVER.to_string()),
            ],
            metrics: vec![("accuracy", metrics.accuracy), ("auc", metrics.auc)],
            model:   snapshot,
        };

        match self.tracking.log_run(&run) {
            Ok(run_id) => {
                tracing::info!("Logged model to tracking run: {}", run_id);
                Some(run_id)
            }
            Err(e) => {
                tracing::warn!("{}; continuing without a tracking record", e);
                None
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use ndarray::array;
    use tempfile::TempDir;

    use crate::data::dataset::Dataset;
    use crate::data::loader::DemoDataset;
    use crate::domain::error::{DataUnavailableError, TrackingSinkError};
    use crate::infra::artifact_store::{ArtifactStore, TIMESTAMP_FORMAT};
    use crate::infra::tracking::LocalTrackingSink;

    struct FailingSink;

    impl TrackingSink for FailingSink {
        fn log_run(&self, _run: &TrackingRun<'_>) -> Result<String, TrackingSinkError> {
            Err(TrackingSinkError("connection refused".into()))
        }
    }

    /// Counts loads; fails if asked to.
    struct ProbeSource {
        loads: Rc<Cell<usize>>,
        fail:  bool,
    }

    impl DatasetSource for ProbeSource {
        fn describe(&self) -> String {
            "probe".into()
        }

        fn load(&self) -> Result<Dataset, DataUnavailableError> {
            self.loads.set(self.loads.get() + 1);
            if self.fail {
                return Err(DataUnavailableError("provider offline".into()));
            }
            DemoDataset::new().load()
        }
    }

    fn use_case(dir: &TempDir, tracking: Box<dyn TrackingSink>) -> TrainUseCase {
        TrainUseCase::new(
            TrainConfig::default(),
            Box::new(DemoDataset::new()),
            ArtifactStore::new(dir.path().join("models")),
            tracking,
        )
    }

    #[test]
    fn test_default_config_matches_contract() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.test_size, 0.2);
        assert_eq!(cfg.random_state, 42);
        assert_eq!(cfg.max_iter, 1000);
        assert_eq!(cfg.c, 1.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let bad = [
            TrainConfig { test_size: 0.0, ..TrainConfig::default() },
            TrainConfig { test_size: 1.0, ..TrainConfig::default() },
            TrainConfig { test_size: f64::NAN, ..TrainConfig::default() },
            TrainConfig { max_iter: 0, ..TrainConfig::default() },
            TrainConfig { c: 0.0, ..TrainConfig::default() },
            TrainConfig { c: -1.0, ..TrainConfig::default() },
            TrainConfig { c: f64::INFINITY, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?} should be rejected");
        }
    }

    #[test]
    fn test_train_writes_new_artifact() {
        let dir = TempDir::new().unwrap();
        let uc  = use_case(&dir, Box::new(LocalTrackingSink::new(dir.path().join("mlruns"))));

        let outcome = uc.execute().unwrap();

        assert!(outcome.artifact_path.exists());
        let name  = outcome.artifact_path.file_name().unwrap().to_str().unwrap();
        let stamp = ArtifactStore::parse_artifact_name(name).unwrap();
        assert!(
            stamp.format(TIMESTAMP_FORMAT).to_string()
                >= outcome.started_at.format(TIMESTAMP_FORMAT).to_string()
        );

        let m = outcome.metrics;
        assert!((0.0..=1.0).contains(&m.accuracy));
        assert!(m.auc.is_nan() || (0.0..=1.0).contains(&m.auc));

        let run_id = outcome.run_id.expect("local sink always succeeds");
        assert!(dir
            .path()
            .join("mlruns")
            .join(DEFAULT_EXPERIMENT)
            .join(run_id)
            .join("metrics.json")
            .exists());
    }

    #[test]
    fn test_tracking_failure_still_persists_artifact() {
        let dir     = TempDir::new().unwrap();
        let outcome = use_case(&dir, Box::new(FailingSink)).execute().unwrap();
        assert!(outcome.run_id.is_none());
        assert!(outcome.artifact_path.exists());
    }

    #[test]
    fn test_saved_artifact_predicts_like_fitted_model() {
        let dir     = TempDir::new().unwrap();
        let outcome = use_case(&dir, Box::new(FailingSink)).execute().unwrap();

        let store  = ArtifactStore::new(dir.path().join("models"));
        let loaded = store.load(&store.latest().unwrap()).unwrap();

        let x = DemoDataset::new().load().unwrap().features().clone();
        assert_eq!(loaded.predict(&x).unwrap(), outcome.model.predict(&x).unwrap());
        assert_eq!(
            loaded.predict_proba(&x).unwrap(),
            outcome.model.predict_proba(&x).unwrap()
        );
        let probe = array![[14.0, 19.0, 92.0, 650.0, 0.1, 0.1, 0.09, 0.05, 0.18, 0.063]];
        assert_eq!(loaded.predict(&probe).unwrap(), outcome.model.predict(&probe).unwrap());
    }

    #[test]
    fn test_invalid_config_fails_before_loading_data() {
        let dir   = TempDir::new().unwrap();
        let loads = Rc::new(Cell::new(0));
        let uc = TrainUseCase::new(
            TrainConfig { max_iter: 0, ..TrainConfig::default() },
            Box::new(ProbeSource { loads: loads.clone(), fail: false }),
            ArtifactStore::new(dir.path().join("models")),
            Box::new(FailingSink),
        );

        assert!(matches!(uc.execute(), Err(TrainError::Config(ConfigError::MaxIter(0)))));
        assert_eq!(loads.get(), 0);
        assert!(!dir.path().join("models").exists());
    }

    #[test]
    fn test_data_unavailable_is_fatal() {
        let dir   = TempDir::new().unwrap();
        let loads = Rc::new(Cell::new(0));
        let uc = TrainUseCase::new(
            TrainConfig::default(),
            Box::new(ProbeSource { loads: loads.clone(), fail: true }),
            ArtifactStore::new(dir.path().join("models")),
            Box::new(FailingSink),
        );

        assert!(matches!(uc.execute(), Err(TrainError::Data(_))));
        assert_eq!(loads.get(), 1);
        assert!(ArtifactStore::new(dir.path().join("models")).list().unwrap().is_empty());
    }
}
