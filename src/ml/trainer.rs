// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fit on the train partition, then score on the test partition.
// Persistence and tracking are the application layer's job.

use crate::application::train_use_case::TrainConfig;
use crate::data::dataset::Dataset;
use crate::domain::error::TrainError;
use crate::ml::evaluation::{accuracy, roc_auc, EvalMetrics};
use crate::ml::model::{create_model, LogisticModel, SOLVER};

pub fn run_training(
    cfg:   &TrainConfig,
    train: &Dataset,
    test:  &Dataset,
) -> Result<(LogisticModel, EvalMetrics), TrainError> {
    let params = create_model(cfg);
    tracing::info!(
        "Fitting logistic regression: solver={}, max_iter={}, C={} on {} rows",
        SOLVER,
        cfg.max_iter,
        cfg.c,
        train.n_samples(),
    );

    let model   = LogisticModel::fit(&params, train)?;
    let metrics = evaluate(&model, test)?;

    tracing::info!(
        "Evaluation on {} test rows: accuracy={:.4}, auc={:.4}",
        test.n_samples(),
        metrics.accuracy,
        metrics.auc,
    );
    Ok((model, metrics))
}

/// Accuracy and ROC-AUC of `model` on `test`.
pub fn evaluate(model: &LogisticModel, test: &Dataset) -> Result<EvalMetrics, TrainError> {
    let proba: Vec<f64> = model
        .predict_proba(test.features())
        .map_err(|e| TrainError::Fit(e.to_string()))?
        .to_vec();
    let pred: Vec<usize> = model
        .predict(test.features())
        .map_err(|e| TrainError::Fit(e.to_string()))?
        .to_vec();

    Ok(EvalMetrics {
        accuracy: accuracy(test.labels(), &pred),
        auc:      roc_auc(test.labels(), &proba),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{loader::DemoDataset, splitter::stratified_split};
    use crate::domain::traits::DatasetSource;
    use ndarray::array;

    #[test]
    fn test_demo_training_scores_in_range() {
        let cfg  = TrainConfig::default();
        let data = DemoDataset::new().load().unwrap();
        let (train, test) = stratified_split(&data, cfg.test_size, cfg.random_state);

        let (model, metrics) = run_training(&cfg, &train, &test).unwrap();
        assert_eq!(model.n_features, data.n_features());
        assert!((0.0..=1.0).contains(&metrics.accuracy));
        assert!((0.0..=1.0).contains(&metrics.auc));
        // the demo classes are well separated
        assert!(metrics.accuracy > 0.8, "accuracy {}", metrics.accuracy);
    }

    #[test]
    fn test_csv_training_with_majority_negative_class() {
        use crate::data::loader::CsvDataset;
        use std::io::Write;
        use tempfile::NamedTempFile;

        // 90 rows of label 0 below the diagonal, 30 rows of label 1 above it
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "x1,x2,label").unwrap();
        for i in 0..90 {
            let t = i as f64 / 30.0;
            writeln!(file, "{},{},0", -1.0 - t, 0.5 * t).unwrap();
        }
        for i in 0..30 {
            let t = i as f64 / 10.0;
            writeln!(file, "{},{},1", 1.0 + t, -0.5 * t).unwrap();
        }

        let cfg  = TrainConfig::default();
        let data = CsvDataset::new(file.path()).load().unwrap();
        assert_eq!(data.class_counts(), [90, 30]);
        let (train, test) = stratified_split(&data, cfg.test_size, cfg.random_state);

        let (_, metrics) = run_training(&cfg, &train, &test).unwrap();
        assert!(metrics.accuracy > 0.5, "accuracy {}", metrics.accuracy);
        assert!(metrics.auc > 0.5, "auc {}", metrics.auc);
    }

    #[test]
    fn test_single_class_test_partition_gives_nan_auc() {
        let model = LogisticModel::from_weights(vec![1.0], 0.0);
        let test  = Dataset::new(array![[1.0], [2.0], [-1.0]], vec![1, 1, 1]).unwrap();
        let metrics = evaluate(&model, &test).unwrap();
        assert!(metrics.auc.is_nan());
        assert!((metrics.accuracy - 2.0 / 3.0).abs() < 1e-12);
    }
}
