// ============================================================
// Layer 4 — Dataset Loaders
// ============================================================
// Two implementations of the DatasetSource trait:
//
//   DemoDataset — a built-in, seeded table shaped like the
//                 Wisconsin diagnostic breast-cancer data:
//                 569 rows, the ten "mean_*" measurements,
//                 212 malignant (label 0) / 357 benign (label 1).
//                 Every call returns exactly the same table.
//
//   CsvDataset  — reads a CSV file with a header row.
//                 All columns must be numeric; the LAST column
//                 is the label and must be 0 or 1.
//
// Any failure becomes a DataUnavailableError, which is fatal
// to the training run.

use std::{fs::File, io::BufReader, path::PathBuf};

use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::Normal;

use crate::data::dataset::Dataset;
use crate::domain::error::DataUnavailableError;
use crate::domain::traits::DatasetSource;

// ─── DemoDataset ──────────────────────────────────────────────────────────────

pub const DEMO_FEATURE_NAMES: [&str; 10] = [
    "mean_radius",
    "mean_texture",
    "mean_perimeter",
    "mean_area",
    "mean_smoothness",
    "mean_compactness",
    "mean_concavity",
    "mean_concave_points",
    "mean_symmetry",
    "mean_fractal_dimension",
];

const DEMO_SEED:      u64   = 0x6e69_6d62;
const DEMO_MALIGNANT: usize = 212;
const DEMO_BENIGN:    usize = 357;

// (mean, std) per feature for malignant (label 0) and benign (label 1)
const MALIGNANT_STATS: [(f64, f64); 10] = [
    (17.46, 3.20), (21.60, 3.78), (115.4, 21.9), (978.4, 368.0), (0.1029, 0.0126),
    (0.1452, 0.0540), (0.1608, 0.0750), (0.0880, 0.0344), (0.1929, 0.0276), (0.0627, 0.0076),
];
const BENIGN_STATS: [(f64, f64); 10] = [
    (12.15, 1.78), (17.91, 4.00), (78.08, 11.8), (462.8, 134.3), (0.0925, 0.0134),
    (0.0801, 0.0337), (0.0461, 0.0434), (0.0257, 0.0159), (0.1742, 0.0248), (0.0629, 0.0067),
];

/// Seeded demo table; see the module header for its shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoDataset;

impl DemoDataset {
    pub fn new() -> Self {
        Self
    }
}

impl DatasetSource for DemoDataset {
    fn describe(&self) -> String {
        format!(
            "built-in demo dataset ({} rows, {} features)",
            DEMO_MALIGNANT + DEMO_BENIGN,
            DEMO_FEATURE_NAMES.len()
        )
    }

    fn load(&self) -> Result<Dataset, DataUnavailableError> {
        let malignant = class_distributions(&MALIGNANT_STATS)?;
        let benign    = class_distributions(&BENIGN_STATS)?;

        let mut rng    = StdRng::seed_from_u64(DEMO_SEED);
        let n_rows     = DEMO_MALIGNANT + DEMO_BENIGN;
        let n_features = DEMO_FEATURE_NAMES.len();

        let mut values = Vec::with_capacity(n_rows * n_features);
        let mut labels = Vec::with_capacity(n_rows);

        for row in 0..n_rows {
            let (label, dists) = if row < DEMO_MALIGNANT {
                (0, &malignant)
            } else {
                (1, &benign)
            };
            for &dist in dists.iter() {
                // measurements are physical quantities, never negative
                values.push(rng.sample(dist).max(0.0));
            }
            labels.push(label);
        }

        let features = Array2::from_shape_vec((n_rows, n_features), values)
            .map_err(|e| DataUnavailableError(e.to_string()))?;
        Dataset::new(features, labels)
    }
}

fn class_distributions(stats: &[(f64, f64)]) -> Result<Vec<Normal<f64>>, DataUnavailableError> {
    stats
        .iter()
        .map(|&(mean, std)| {
            Normal::new(mean, std)
                .map_err(|e| DataUnavailableError(format!("demo feature N({mean}, {std}): {e}")))
        })
        .collect()
}

// ─── CsvDataset ───────────────────────────────────────────────────────────────

/// A CSV file with a header row and the 0/1 label in the last column.
#[derive(Debug, Clone)]
pub struct CsvDataset {
    path: PathBuf,
}

impl CsvDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for CsvDataset {
    fn describe(&self) -> String {
        format!("CSV file '{}'", self.path.display())
    }

    fn load(&self) -> Result<Dataset, DataUnavailableError> {
        let file = File::open(&self.path).map_err(|e| {
            DataUnavailableError(format!("cannot open '{}': {e}", self.path.display()))
        })?;
        let mut reader = csv::Reader::from_reader(BufReader::new(file));

        let n_columns = reader
            .headers()
            .map_err(|e| DataUnavailableError(format!("cannot read CSV header: {e}")))?
            .len();
        if n_columns < 2 {
            return Err(DataUnavailableError(format!(
                "expected at least one feature column and a label column, found {n_columns} column(s)"
            )));
        }
        let n_features = n_columns - 1;

        let mut values = Vec::new();
        let mut labels = Vec::new();

        for (i, result) in reader.records().enumerate() {
            // header is line 1
            let line   = i + 2;
            let record = result.map_err(|e| DataUnavailableError(format!("line {line}: {e}")))?;

            let mut parsed = Vec::with_capacity(n_columns);
            for field in record.iter() {
                let v = field.trim().parse::<f64>().map_err(|_| {
                    DataUnavailableError(format!("line {line}: '{field}' is not a number"))
                })?;
                parsed.push(v);
            }

            let label = match parsed.pop() {
                Some(v) if v == 0.0 => 0,
                Some(v) if v == 1.0 => 1,
                Some(v) => {
                    return Err(DataUnavailableError(format!(
                        "line {line}: label must be 0 or 1, got {v}"
                    )))
                }
                None => return Err(DataUnavailableError(format!("line {line}: empty record"))),
            };
            values.extend(parsed);
            labels.push(label);
        }

        let features = Array2::from_shape_vec((labels.len(), n_features), values)
            .map_err(|e| DataUnavailableError(e.to_string()))?;
        let dataset = Dataset::new(features, labels)?;

        tracing::info!(
            "Loaded {} rows x {} features from '{}'",
            dataset.n_samples(),
            dataset.n_features(),
            self.path.display()
        );
        Ok(dataset)
    }
}
