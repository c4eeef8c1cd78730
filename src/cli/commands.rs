// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `serve` and `latest`
// and all their configurable flags.
//
// Flags that make sense in a deployment (tracking URI, host,
// port) can also come from the environment or a .env file.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::serve_use_case::ServeConfig;
use crate::application::train_use_case::{TrainConfig, DEFAULT_EXPERIMENT};
use crate::infra::tracking::DEFAULT_TRACKING_DIR;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier and save a new model version
    Train(TrainArgs),

    /// Serve the latest model over HTTP
    Serve(ServeArgs),

    /// Print the path of the model version `serve` would load
    Latest(LatestArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Fraction of each class held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Seed of the train/test split
    #[arg(long, default_value_t = 42)]
    pub random_state: u64,

    /// Maximum solver iterations
    #[arg(long, default_value_t = 1000)]
    pub max_iter: u64,

    /// Inverse regularisation strength (smaller = stronger)
    #[arg(long = "c", default_value_t = 1.0)]
    pub c: f64,

    /// Directory that receives model artifacts
    #[arg(long, default_value = "models")]
    pub models_dir: PathBuf,

    /// CSV file to train on (header row, label in the last column).
    /// The built-in demo dataset is used when omitted.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// MLflow server URL or local directory for run tracking
    #[arg(long, env = "MLFLOW_TRACKING_URI", default_value = DEFAULT_TRACKING_DIR)]
    pub tracking_uri: String,

    /// Experiment name runs are grouped under
    #[arg(long, default_value = DEFAULT_EXPERIMENT)]
    pub experiment: String,
}

/// The hyperparameter part of the flags; the rest wires up
/// data source, store and tracking.
impl From<&TrainArgs> for TrainConfig {
    fn from(a: &TrainArgs) -> Self {
        TrainConfig {
            test_size:    a.test_size,
            random_state: a.random_state,
            max_iter:     a.max_iter,
            c:            a.c,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory the latest model is loaded from
    #[arg(long, default_value = "models")]
    pub models_dir: PathBuf,
}

impl From<ServeArgs> for ServeConfig {
    fn from(a: ServeArgs) -> Self {
        ServeConfig {
            host:       a.host,
            port:       a.port,
            models_dir: a.models_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct LatestArgs {
    #[arg(long, default_value = "models")]
    pub models_dir: PathBuf,
}
