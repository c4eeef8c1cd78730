// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a dataset provider and the model fit:
//
//   DemoDataset / CsvDataset   → produce a Dataset
//       │
//       ▼
//   stratified_split           → (train, test), class ratios kept
//       │
//       ▼
//   ml::trainer                → fit + evaluate

/// Binary-labelled feature table
pub mod dataset;

/// Built-in demo dataset and CSV loader
pub mod loader;

/// Label-stratified, seeded train/test split
pub mod splitter;
