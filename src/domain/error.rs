// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure the system distinguishes has its own type here.
// The application and CLI layers wrap these in anyhow; the HTTP
// layer maps ServiceError onto status codes (see api::error).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid training configuration, rejected before any data is loaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("test_size must be strictly between 0 and 1, got {0}")]
    TestSize(f64),

    #[error("max_iter must be a positive integer, got {0}")]
    MaxIter(u64),

    #[error("C must be a positive, finite number, got {0}")]
    InverseRegularization(f64),
}

/// The dataset provider could not produce a usable dataset.
#[derive(Debug, Error)]
#[error("Dataset unavailable: {0}")]
pub struct DataUnavailableError(pub String);

/// The experiment-tracking sink was unreachable or rejected a call.
#[derive(Debug, Error)]
#[error("Tracking sink error: {0}")]
pub struct TrackingSinkError(pub String);

/// Failures of the on-disk artifact store.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Directory missing, or no file in it matches the naming pattern.
    #[error("No model artifacts found in '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("Artifact '{}' could not be deserialised: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Could not serialise model: {0}")]
    Serialize(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ArtifactError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Anything that stops a training run from producing an artifact.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataUnavailableError),

    #[error("Model fitting failed: {0}")]
    Fit(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Failures on the serving path.
///
/// `Display` carries the full diagnostic (including paths) for logs;
/// [`ServiceError::public_message`] is what a client gets to see.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Corrupt model artifact: {0}")]
    CorruptArtifact(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Model inference failed: {0}")]
    Inference(String),
}

impl ServiceError {
    /// Message safe to return to clients: no file-system paths.
    pub fn public_message(&self) -> String {
        match self {
            Self::ModelUnavailable(_) => {
                "Model is not available. Train a model and retry.".to_string()
            }
            Self::CorruptArtifact(_) => "Model artifact could not be loaded.".to_string(),
            Self::InvalidRequest(msg) => msg.clone(),
            Self::Inference(_) => self.to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::Inference(_))
    }
}

impl From<ArtifactError> for ServiceError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::Corrupt { .. } => Self::CorruptArtifact(err.to_string()),
            other => Self::ModelUnavailable(other.to_string()),
        }
    }
}
