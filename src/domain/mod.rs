// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that describe the system:
// what a prediction request looks like, what can go wrong,
// and the seams the other layers plug into.
//
// Rules for this layer:
//   - NO HTTP, file I/O or model fitting code
//   - Only structs, enums, error types and traits

/// Error taxonomy for training, storage and serving
pub mod error;

/// Request / response contract of the inference boundary
pub mod prediction;

/// Core abstractions (dataset providers, tracking sinks)
pub mod traits;
