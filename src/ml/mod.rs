// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// All linfa / ndarray model code lives here.
//
//   model.rs      — classifier construction (create_model) and
//                   the serialisable LogisticModel snapshot
//
//   evaluation.rs — accuracy and ROC-AUC on the test partition
//
//   trainer.rs    — fit + evaluate for one training run
//
//   inferencer.rs — the serving-side InferenceService: lazy,
//                   load-once model handle plus request
//                   validation and prediction

/// Logistic-regression model and its construction
pub mod model;

/// Test-partition metrics
pub mod evaluation;

/// Fit and evaluate
pub mod trainer;

/// Lazily loaded model and the prediction contract
pub mod inferencer;
