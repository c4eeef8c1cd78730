// ============================================================
// Layer 5 — Evaluation Metrics
// ============================================================
// Scores a fitted model on the held-out test partition.
//
//   accuracy — fraction of rows whose predicted label is correct
//   auc      — area under the ROC curve of the positive-class
//              probabilities (Mann–Whitney rank formulation,
//              tied scores get their average rank)
//
// AUC is undefined when the test partition holds only one class;
// it is reported as NaN in that case instead of failing the run.

use serde::Serialize;

/// Test-partition scores of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvalMetrics {
    pub accuracy: f64,
    pub auc:      f64,
}

/// Fraction of matching labels. NaN for empty input.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return f64::NAN;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// ROC-AUC of `scores` against binary `y_true` (1 = positive).
pub fn roc_auc(y_true: &[usize], scores: &[f64]) -> f64 {
    let n     = y_true.len().min(scores.len());
    let n_pos = y_true[..n].iter().filter(|&&y| y == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // 1-based ranks, ties averaged
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = (0..n).filter(|&k| y_true[k] == 1).map(|k| ranks[k]).sum();
    let n_pos = n_pos as f64;
    (pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64)
}
