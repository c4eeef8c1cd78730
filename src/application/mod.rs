// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only. Each use case tells the other
// layers what to do and in which order:
//
//   train_use_case.rs — load, split, fit, evaluate, track, save
//   serve_use_case.rs — warm up the model and run the HTTP server
//
// No model math and no user-facing printing here.

/// The training workflow
pub mod train_use_case;

/// The serving workflow
pub mod serve_use_case;
