// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and discovers versioned model artifacts on disk.
//
// File naming convention (one flat directory, no index file):
//
//   models/
//     model_logreg_20240101_000000.json
//     model_logreg_20240102_000000.json   ← latest
//
// New artifacts are written as .json; discovery accepts any
// extension after the fixed-width timestamp.
//
// The timestamp is UTC with second resolution and fixed width,
// so sorting file names lexicographically sorts them by time.
// "Latest" is simply the maximum name among files that match the
// pattern; the directory is re-listed on every call.
//
// Artifacts are never overwritten or deleted. If a name is
// already taken (two saves within the same second), the
// timestamp is advanced one second at a time until a free name
// is found, which keeps name order equal to save order.
//
// Contents: the LogisticModel snapshot serialised as JSON.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::domain::error::ArtifactError;
use crate::ml::inferencer::{LoadedModel, ModelSource};
use crate::ml::model::LogisticModel;

pub const ARTIFACT_PREFIX:    &str = "model_logreg_";
pub const ARTIFACT_EXTENSION: &str = "json";
pub const TIMESTAMP_FORMAT:   &str = "%Y%m%d_%H%M%S";

/// How many successive seconds `save` tries before giving up.
const MAX_NAME_ATTEMPTS: usize = 60;

/// Filesystem-backed store of model artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// The directory is created lazily by the first `save`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `model_logreg_YYYYMMDD_HHMMSS.json` for `timestamp`.
    pub fn artifact_name(timestamp: DateTime<Utc>) -> String {
        format!(
            "{ARTIFACT_PREFIX}{}.{ARTIFACT_EXTENSION}",
            timestamp.format(TIMESTAMP_FORMAT)
        )
    }

    /// Parse the timestamp out of an artifact file name, if it is one.
    ///
    /// Any non-empty extension matches; `save` always writes `.json`,
    /// and a body that is not a model is reported by `load`.
    pub fn parse_artifact_name(name: &str) -> Option<DateTime<Utc>> {
        let (stamp, ext) = name.strip_prefix(ARTIFACT_PREFIX)?.split_once('.')?;
        if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }

        let fixed_width = stamp.len() == 15
            && stamp
                .bytes()
                .enumerate()
                .all(|(i, b)| if i == 8 { b == b'_' } else { b.is_ascii_digit() });
        if !fixed_width {
            return None;
        }

        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Serialise `model` to a new artifact named after `timestamp`.
    ///
    /// Creates the directory if needed. Never overwrites an existing file.
    pub fn save(
        &self,
        model:     &LogisticModel,
        timestamp: DateTime<Utc>,
    ) -> Result<PathBuf, ArtifactError> {
        fs::create_dir_all(&self.dir).map_err(|e| ArtifactError::io(&self.dir, e))?;

        let body = serde_json::to_vec_pretty(model)
            .map_err(|e| ArtifactError::Serialize(e.to_string()))?;

        let mut stamp = timestamp;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(Self::artifact_name(stamp));

            // create_new fails instead of truncating an existing artifact
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&body)
                        .and_then(|_| file.sync_all())
                        .map_err(|e| ArtifactError::io(&path, e))?;
                    tracing::info!("Saved model artifact: {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::warn!(
                        "Artifact '{}' already exists; advancing timestamp by one second",
                        path.display()
                    );
                    stamp += Duration::seconds(1);
                }
                Err(e) => return Err(ArtifactError::io(&path, e)),
            }
        }

        Err(ArtifactError::io(
            &self.dir,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free artifact name within {MAX_NAME_ATTEMPTS} seconds of {timestamp}"),
            ),
        ))
    }

    /// All artifact paths in the directory, oldest first.
    ///
    /// A missing directory yields an empty list.
    pub fn list(&self) -> Result<Vec<PathBuf>, ArtifactError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ArtifactError::io(&self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::io(&self.dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if let Some(name) = entry.file_name().to_str() {
                if is_file && Self::parse_artifact_name(name).is_some() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names.into_iter().map(|n| self.dir.join(n)).collect())
    }

    /// Path of the newest artifact (lexicographic maximum of the names).
    pub fn latest(&self) -> Result<PathBuf, ArtifactError> {
        self.list()?
            .pop()
            .ok_or_else(|| ArtifactError::NotFound(self.dir.clone()))
    }

    /// Deserialise the artifact at `path`.
    pub fn load(&self, path: &Path) -> Result<LogisticModel, ArtifactError> {
        let bytes = fs::read(path).map_err(|e| ArtifactError::io(path, e))?;

        let model: LogisticModel =
            serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Corrupt {
                path:   path.to_path_buf(),
                reason: e.to_string(),
            })?;
        model.validate().map_err(|reason| ArtifactError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })?;

        tracing::debug!("Loaded artifact '{}' ({} features)", path.display(), model.n_features);
        Ok(model)
    }
}

impl ModelSource for ArtifactStore {
    fn load_latest(&self) -> Result<LoadedModel, ArtifactError> {
        let path  = self.latest()?;
        let model = self.load(&path)?;
        Ok(LoadedModel { path, model })
    }
}
