// ============================================================
// Layer 6 — Experiment Tracking Sinks
// ============================================================
// Records parameters, metrics and a model snapshot per training
// run. Tracking is best-effort: the trainer logs any error from
// here as a warning and carries on to write the artifact.
//
// The target is chosen from MLFLOW_TRACKING_URI (or --tracking-uri):
//
//   http://host:5000 / https://...  → MlflowTrackingSink (REST API)
//   file:/some/dir, /some/dir, ...  → LocalTrackingSink
//   unset                           → LocalTrackingSink at ./mlruns
//
// Local layout:
//
//   mlruns/
//     <experiment>/
//       <run_id>/
//         meta.json      ← run id, name, experiment, start time
//         params.json
//         metrics.json   ← NaN metrics are written as null
//         model/model.json

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::Utc;
use reqwest::{blocking::Client, StatusCode};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::error::TrackingSinkError;
use crate::domain::traits::{TrackingRun, TrackingSink};

pub const DEFAULT_TRACKING_DIR: &str = "mlruns";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Where tracking data goes, parsed from a tracking URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingTarget {
    Local(PathBuf),
    Mlflow(String),
}

impl TrackingTarget {
    pub fn parse(uri: &str) -> Self {
        let uri = uri.trim();
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return Self::Mlflow(uri.trim_end_matches('/').to_string());
        }
        let path = uri
            .strip_prefix("file://")
            .or_else(|| uri.strip_prefix("file:"))
            .unwrap_or(uri);
        if path.is_empty() {
            Self::Local(PathBuf::from(DEFAULT_TRACKING_DIR))
        } else {
            Self::Local(PathBuf::from(path))
        }
    }

    pub fn into_sink(self) -> Box<dyn TrackingSink> {
        match self {
            Self::Local(root)    => Box::new(LocalTrackingSink::new(root)),
            Self::Mlflow(base)   => Box::new(MlflowTrackingSink::new(base)),
        }
    }
}

fn sink_err(context: &str, err: impl std::fmt::Display) -> TrackingSinkError {
    TrackingSinkError(format!("{context}: {err}"))
}

// ─── LocalTrackingSink ────────────────────────────────────────────────────────

/// Writes each run to its own directory under `root`.
#[derive(Debug, Clone)]
pub struct LocalTrackingSink {
    root: PathBuf,
}

impl LocalTrackingSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn write_json(path: &Path, value: &Value) -> Result<(), TrackingSinkError> {
        let body = serde_json::to_vec_pretty(value).map_err(|e| sink_err("serialise", e))?;
        fs::write(path, body).map_err(|e| sink_err(&format!("write '{}'", path.display()), e))
    }
}

/// Experiment names become directory names; keep them to one path segment.
fn dir_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

impl TrackingSink for LocalTrackingSink {
    fn log_run(&self, run: &TrackingRun<'_>) -> Result<String, TrackingSinkError> {
        let run_id  = Uuid::new_v4().simple().to_string();
        let run_dir = self.root.join(dir_safe(run.experiment)).join(&run_id);
        let model_dir = run_dir.join("model");
        fs::create_dir_all(&model_dir)
            .map_err(|e| sink_err(&format!("create '{}'", model_dir.display()), e))?;

        let params: Map<String, Value> = run
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();
        let metrics: Map<String, Value> = run
            .metrics
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();

        Self::write_json(
            &run_dir.join("meta.json"),
            &json!({
                "run_id":     run_id,
                "run_name":   run.run_name,
                "experiment": run.experiment,
                "start_time": Utc::now().to_rfc3339(),
                "status":     "FINISHED",
            }),
        )?;
        Self::write_json(&run_dir.join("params.json"), &Value::Object(params))?;
        Self::write_json(&run_dir.join("metrics.json"), &Value::Object(metrics))?;
        Self::write_json(&model_dir.join("model.json"), &run.model)?;

        tracing::debug!("Tracking run written to '{}'", run_dir.display());
        Ok(run_id)
    }
}

// ─── MlflowTrackingSink ───────────────────────────────────────────────────────

/// Talks to an MLflow tracking server over its 2.0 REST API.
///
/// The model snapshot is uploaded through the server's artifact
/// proxy (`mlflow server --serve-artifacts`, the default since 2.0).
#[derive(Debug, Clone)]
pub struct MlflowTrackingSink {
    base_url: String,
}

impl MlflowTrackingSink {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    fn api(&self, endpoint: &str) -> String {
        format!("{}/api/2.0/mlflow/{endpoint}", self.base_url)
    }

    fn post(&self, client: &Client, endpoint: &str, body: Value) -> Result<Value, TrackingSinkError> {
        client
            .post(self.api(endpoint))
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<Value>())
            .map_err(|e| sink_err(endpoint, e))
    }

    fn experiment_id(&self, client: &Client, name: &str) -> Result<String, TrackingSinkError> {
        let resp = client
            .get(self.api("experiments/get-by-name"))
            .query(&[("experiment_name", name)])
            .send()
            .map_err(|e| sink_err("experiments/get-by-name", e))?;

        if resp.status() != StatusCode::NOT_FOUND {
            let body: Value = resp
                .error_for_status()
                .and_then(|r| r.json())
                .map_err(|e| sink_err("experiments/get-by-name", e))?;
            if let Some(id) = body.pointer("/experiment/experiment_id").and_then(Value::as_str) {
                return Ok(id.to_string());
            }
        }

        tracing::info!("Creating MLflow experiment '{}'", name);
        let body = self.post(client, "experiments/create", json!({ "name": name }))?;
        body.get("experiment_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TrackingSinkError("experiments/create: no experiment_id in response".into()))
    }

    fn log_into_run(
        &self,
        client:        &Client,
        experiment_id: &str,
        run_id:        &str,
        run:           &TrackingRun<'_>,
    ) -> Result<(), TrackingSinkError> {
        let now = Utc::now().timestamp_millis();

        let params: Vec<Value> = run
            .params
            .iter()
            .map(|(k, v)| json!({ "key": k, "value": v }))
            .collect();

        // MLflow's JSON API has no NaN; undefined metrics are skipped
        let mut metrics = Vec::new();
        for (k, v) in &run.metrics {
            if v.is_finite() {
                metrics.push(json!({ "key": k, "value": v, "timestamp": now, "step": 0 }));
            } else {
                tracing::warn!("Metric '{}' is {} and is not sent to MLflow", k, v);
            }
        }

        self.post(
            client,
            "runs/log-batch",
            json!({ "run_id": run_id, "params": params, "metrics": metrics }),
        )?;

        let url = format!(
            "{}/api/2.0/mlflow-artifacts/artifacts/{experiment_id}/{run_id}/artifacts/model/model.json",
            self.base_url
        );
        let body = serde_json::to_vec_pretty(&run.model).map_err(|e| sink_err("serialise model", e))?;
        client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| sink_err("upload model artifact", e))?;

        Ok(())
    }

    fn finish_run(&self, client: &Client, run_id: &str, status: &str) -> Result<(), TrackingSinkError> {
        self.post(
            client,
            "runs/update",
            json!({ "run_id": run_id, "status": status, "end_time": Utc::now().timestamp_millis() }),
        )
        .map(|_| ())
    }
}

impl TrackingSink for MlflowTrackingSink {
    fn log_run(&self, run: &TrackingRun<'_>) -> Result<String, TrackingSinkError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| sink_err("build HTTP client", e))?;

        let experiment_id = self.experiment_id(&client, run.experiment)?;

        let created = self.post(
            &client,
            "runs/create",
            json!({
                "experiment_id": experiment_id,
                "run_name":      run.run_name,
                "start_time":    Utc::now().timestamp_millis(),
            }),
        )?;
        let run_id = created
            .pointer("/run/info/run_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TrackingSinkError("runs/create: no run_id in response".into()))?;

        if let Err(e) = self.log_into_run(&client, &experiment_id, &run_id, run) {
            // leave the run marked as failed rather than dangling in RUNNING
            if let Err(cleanup) = self.finish_run(&client, &run_id, "FAILED") {
                tracing::warn!("Could not mark MLflow run {} as FAILED: {}", run_id, cleanup);
            }
            return Err(e);
        }
        self.finish_run(&client, &run_id, "FINISHED")?;

        tracing::info!("Logged run {} to MLflow at {}", run_id, self.base_url);
        Ok(run_id)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_run() -> TrackingRun<'static> {
        TrackingRun {
            experiment: "nimbusops/breast cancer",
            run_name:   "logreg-baseline",
            params:     vec![("test_size", "0.2".into()), ("C", "1".into())],
            metrics:    vec![("accuracy", 0.95), ("auc", f64::NAN)],
            model:      json!({ "n_features": 2 }),
        }
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!(
            TrackingTarget::parse("http://localhost:5000/"),
            TrackingTarget::Mlflow("http://localhost:5000".into())
        );
        assert_eq!(
            TrackingTarget::parse("file:///tmp/runs"),
            TrackingTarget::Local(PathBuf::from("/tmp/runs"))
        );
        assert_eq!(
            TrackingTarget::parse("file:relative/runs"),
            TrackingTarget::Local(PathBuf::from("relative/runs"))
        );
        assert_eq!(
            TrackingTarget::parse(""),
            TrackingTarget::Local(PathBuf::from(DEFAULT_TRACKING_DIR))
        );
    }

    #[test]
    fn test_local_sink_writes_run_directory() {
        let dir    = TempDir::new().unwrap();
        let sink   = LocalTrackingSink::new(dir.path());
        let run_id = sink.log_run(&sample_run()).unwrap();

        let run_dir = dir.path().join("nimbusops_breast_cancer").join(&run_id);
        let params: Value =
            serde_json::from_slice(&fs::read(run_dir.join("params.json")).unwrap()).unwrap();
        let metrics: Value =
            serde_json::from_slice(&fs::read(run_dir.join("metrics.json")).unwrap()).unwrap();

        assert_eq!(params["test_size"], "0.2");
        assert_eq!(metrics["accuracy"], 0.95);
        assert!(metrics["auc"].is_null());
        assert!(run_dir.join("model").join("model.json").exists());
    }

    /// Minimal MLflow stand-in: answers experiment lookup and run creation,
    /// fails everything else with 500. Returns the request paths it saw.
    fn canned_mlflow(requests: usize) -> (String, std::thread::JoinHandle<Vec<String>>) {
        use std::io::{BufRead, BufReader, Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base     = format!("http://{}", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for stream in listener.incoming().take(requests) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap();
                    }
                }
                let mut request_body = vec![0; content_length];
                reader.read_exact(&mut request_body).unwrap();

                let path = request_line.split_whitespace().nth(1).unwrap_or("").to_string();
                let (status, body) = if path.contains("experiments/get-by-name") {
                    ("200 OK", r#"{"experiment":{"experiment_id":"7"}}"#)
                } else if path.contains("runs/create") {
                    ("200 OK", r#"{"run":{"info":{"run_id":"abc"}}}"#)
                } else {
                    ("500 Internal Server Error", r#"{"error_code":"INTERNAL_ERROR"}"#)
                };
                write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                seen.push(path);
            }
            seen
        });
        (base, handle)
    }

    #[test]
    fn test_mlflow_logging_failure_reports_original_error() {
        // get-by-name, runs/create, runs/log-batch (500), runs/update FAILED (500)
        let (base, server) = canned_mlflow(4);
        let err = MlflowTrackingSink::new(base).log_run(&sample_run()).unwrap_err();

        assert!(err.to_string().contains("runs/log-batch"), "{err}");
        let seen = server.join().unwrap();
        assert_eq!(seen.last().map(String::as_str), Some("/api/2.0/mlflow/runs/update"));
    }

    #[test]
    fn test_unreachable_mlflow_is_sink_error() {
        // port 9 (discard) is closed on test machines
        let sink = MlflowTrackingSink::new("http://127.0.0.1:9");
        assert!(sink.log_run(&sample_run()).is_err());
    }
}
