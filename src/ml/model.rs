// ============================================================
// Layer 5 — Logistic Regression Model
// ============================================================
// Fitting is delegated to linfa-logistic (L-BFGS via argmin).
// What we keep afterwards is a plain, serialisable snapshot:
//
//   means / scales  — per-feature standardisation fitted on the
//                     training partition
//   coefficients    — one weight per (standardised) feature
//   intercept       — bias term
//
//   p(y = 1 | x) = sigmoid( ((x - means) / scales) · coefficients + intercept )
//
// The snapshot is what the artifact store writes to disk and what
// the inference service evaluates, so a saved-then-loaded model
// gives exactly the predictions of the freshly fitted one.

use linfa::{traits::Fit, DatasetBase};
use linfa_logistic::LogisticRegression;
use ndarray::{aview1, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::train_use_case::TrainConfig;
use crate::data::dataset::Dataset;
use crate::domain::error::TrainError;

/// Optimiser used by linfa-logistic; recorded with every run.
pub const SOLVER: &str = "lbfgs";

/// Probability at or above which a row is labelled positive (1).
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Columns with a smaller spread than this are left unscaled.
const MIN_SCALE: f64 = 1e-12;

/// Configure an unfitted classifier from the training config.
///
/// `C` is the inverse regularisation strength, so the L2 penalty
/// handed to linfa is `1 / C`.
pub fn create_model(cfg: &TrainConfig) -> LogisticRegression<f64> {
    LogisticRegression::default()
        .alpha(1.0 / cfg.c)
        .max_iterations(cfg.max_iter)
        .with_intercept(true)
}

/// Input rejected before the model is evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelInputError {
    #[error("X has {actual} features, but the model expects {expected} features")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("X contains NaN or infinite values")]
    NonFinite,
}

/// Fitted binary logistic-regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub n_features:   usize,
    pub means:        Vec<f64>,
    pub scales:       Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept:    f64,
}

impl LogisticModel {
    /// Standardise `train`, fit with `params`, and snapshot the result.
    pub fn fit(params: &LogisticRegression<f64>, train: &Dataset) -> Result<Self, TrainError> {
        let x = train.features();

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| TrainError::Fit("training partition is empty".into()))?;
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s < MIN_SCALE { 1.0 } else { s });

        let standardized = (x - &means) / &scales;
        let targets: Array1<bool> = train.labels().iter().map(|&y| y == 1).collect();

        let fitted = params
            .fit(&DatasetBase::new(standardized, targets))
            .map_err(|e| TrainError::Fit(e.to_string()))?;

        // linfa's positive class is the more frequent one (first seen on a
        // tie); the snapshot always scores p(y = 1)
        let sign = if fitted.labels().pos.class { 1.0 } else { -1.0 };

        let model = Self {
            n_features:   x.ncols(),
            means:        means.to_vec(),
            scales:       scales.to_vec(),
            coefficients: fitted.params().mapv(|w| sign * w).to_vec(),
            intercept:    sign * fitted.intercept(),
        };
        model.validate().map_err(TrainError::Fit)?;
        Ok(model)
    }

    #[cfg(test)]
    pub(crate) fn from_weights(coefficients: Vec<f64>, intercept: f64) -> Self {
        let n = coefficients.len();
        Self {
            n_features: n,
            means:      vec![0.0; n],
            scales:     vec![1.0; n],
            coefficients,
            intercept,
        }
    }

    /// Structural check used after fitting and after deserialisation.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.n_features;
        if n == 0 {
            return Err("model has zero features".into());
        }
        for (name, len) in [
            ("means", self.means.len()),
            ("scales", self.scales.len()),
            ("coefficients", self.coefficients.len()),
        ] {
            if len != n {
                return Err(format!("{name} has {len} entries, expected {n}"));
            }
        }
        if self.scales.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err("scales must be positive and finite".into());
        }
        let finite = self
            .means
            .iter()
            .chain(&self.coefficients)
            .chain(std::iter::once(&self.intercept))
            .all(|v| v.is_finite());
        if !finite {
            return Err("parameters contain NaN or infinite values".into());
        }
        Ok(())
    }

    pub fn check_input(&self, x: &Array2<f64>) -> Result<(), ModelInputError> {
        if x.ncols() != self.n_features {
            return Err(ModelInputError::DimensionMismatch {
                expected: self.n_features,
                actual:   x.ncols(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ModelInputError::NonFinite);
        }
        Ok(())
    }

    /// Linear score before the sigmoid.
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelInputError> {
        self.check_input(x)?;
        let standardized = (x - &aview1(&self.means)) / &aview1(&self.scales);
        Ok(standardized.dot(&aview1(&self.coefficients)) + self.intercept)
    }

    /// Positive-class probability per row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelInputError> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }

    /// Class label (0 or 1) per row.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>, ModelInputError> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| usize::from(p >= DECISION_THRESHOLD)))
    }
}

/// Numerically stable logistic function.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_dataset() -> Dataset {
        let mut rows   = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let t = i as f64 / 10.0;
            rows.extend([-2.0 - t, 1.0 + 0.1 * t]);
            labels.push(0);
            rows.extend([2.0 + t, 1.0 - 0.1 * t]);
            labels.push(1);
        }
        Dataset::new(Array2::from_shape_vec((80, 2), rows).unwrap(), labels).unwrap()
    }

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_predict_from_known_weights() {
        let model = LogisticModel::from_weights(vec![1.0, -1.0], 0.0);
        let x     = array![[3.0, 0.0], [0.0, 3.0], [1.0, 1.0]];
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[0] > 0.9);
        assert!(proba[1] < 0.1);
        assert_eq!(proba[2], 0.5);
        assert_eq!(model.predict(&x).unwrap().to_vec(), vec![1, 0, 1]);
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let model = LogisticModel::from_weights(vec![1.0, 2.0], 0.0);
        let err   = model.predict(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert_eq!(err, ModelInputError::DimensionMismatch { expected: 2, actual: 3 });
    }

    #[test]
    fn test_fit_separates_classes() {
        let ds    = separable_dataset();
        let model = LogisticModel::fit(&create_model(&TrainConfig::default()), &ds).unwrap();
        assert_eq!(model.n_features, 2);

        let pred = model.predict(ds.features()).unwrap();
        assert_eq!(pred.to_vec(), ds.labels().to_vec());

        // positive class is label 1: its rows get the high probabilities
        let proba = model.predict_proba(&array![[5.0, 1.0], [-5.0, 1.0]]).unwrap();
        assert!(proba[0] > 0.5 && proba[1] < 0.5);
    }

    #[test]
    fn test_fit_with_majority_negative_class() {
        // 60 rows of label 0 on the left, 20 rows of label 1 on the right
        let mut rows   = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            rows.extend([-1.0 - i as f64 / 20.0, 0.5]);
            labels.push(0);
        }
        for i in 0..20 {
            rows.extend([1.0 + i as f64 / 10.0, 0.5]);
            labels.push(1);
        }
        let ds = Dataset::new(Array2::from_shape_vec((80, 2), rows).unwrap(), labels).unwrap();

        let model = LogisticModel::fit(&create_model(&TrainConfig::default()), &ds).unwrap();
        let proba = model.predict_proba(&array![[5.0, 0.0], [-5.0, 0.0]]).unwrap();
        assert!(proba[0] > 0.5, "p(y=1 | x=+5) = {}", proba[0]);
        assert!(proba[1] < 0.5, "p(y=1 | x=-5) = {}", proba[1]);
        assert_eq!(model.predict(ds.features()).unwrap().to_vec(), ds.labels().to_vec());
    }

    #[test]
    fn test_fit_with_majority_positive_class() {
        let mut rows   = Vec::new();
        let mut labels = Vec::new();
        for i in 0..15 {
            rows.extend([-1.0 - i as f64 / 10.0]);
            labels.push(0);
        }
        for i in 0..45 {
            rows.extend([1.0 + i as f64 / 20.0]);
            labels.push(1);
        }
        let ds = Dataset::new(Array2::from_shape_vec((60, 1), rows).unwrap(), labels).unwrap();

        let model = LogisticModel::fit(&create_model(&TrainConfig::default()), &ds).unwrap();
        let proba = model.predict_proba(&array![[4.0], [-4.0]]).unwrap();
        assert!(proba[0] > 0.5 && proba[1] < 0.5);
    }

    #[test]
    fn test_stronger_regularisation_shrinks_weights() {
        let ds     = separable_dataset();
        let loose  = TrainConfig { c: 100.0, ..TrainConfig::default() };
        let strict = TrainConfig { c: 0.01, ..TrainConfig::default() };
        let w_loose  = LogisticModel::fit(&create_model(&loose), &ds).unwrap();
        let w_strict = LogisticModel::fit(&create_model(&strict), &ds).unwrap();
        let norm = |m: &LogisticModel| m.coefficients.iter().map(|w| w * w).sum::<f64>();
        assert!(norm(&w_strict) < norm(&w_loose));
    }

    #[test]
    fn test_validate_catches_length_mismatch() {
        let mut model = LogisticModel::from_weights(vec![1.0, 2.0], 0.0);
        model.scales.pop();
        assert!(model.validate().is_err());
    }
}
