use ndarray::{Array2, Axis};

use crate::domain::error::DataUnavailableError;

/// A binary-labelled feature table: one row per sample, labels 0 or 1.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    labels:   Vec<usize>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Vec<usize>) -> Result<Self, DataUnavailableError> {
        if features.nrows() != labels.len() {
            return Err(DataUnavailableError(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if features.nrows() == 0 || features.ncols() == 0 {
            return Err(DataUnavailableError("dataset is empty".into()));
        }
        if let Some(bad) = labels.iter().find(|&&y| y > 1) {
            return Err(DataUnavailableError(format!(
                "labels must be 0 or 1, found {bad}"
            )));
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(DataUnavailableError("features contain NaN or infinite values".into()));
        }
        Ok(Self { features, labels })
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// `[count of label 0, count of label 1]`
    pub fn class_counts(&self) -> [usize; 2] {
        self.labels.iter().fold([0, 0], |mut acc, &y| {
            acc[y] += 1;
            acc
        })
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels:   indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}
