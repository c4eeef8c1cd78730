// ============================================================
// Layer 2 — ServeUseCase
// ============================================================
// Starts the prediction service:
//
//   Step 1: Build the InferenceService over the artifact store
//   Step 2: Warm-up load of the latest model (a failure is only
//           logged; the first /predict retries)
//   Step 3: Bind the listener and serve until Ctrl-C

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::api;
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::inferencer::InferenceService;

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host:       String,
    pub port:       u16,
    pub models_dir: PathBuf,
}

pub struct ServeUseCase {
    config: ServeConfig,
}

impl ServeUseCase {
    pub fn new(config: ServeConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let cfg = self.config;

        // ── Step 1: Service ──────────────────────────────────────────────────
        let store   = ArtifactStore::new(&cfg.models_dir);
        let service = Arc::new(InferenceService::new(Arc::new(store)));

        // ── Step 2: Warm-up ──────────────────────────────────────────────────
        match service.get_model().await {
            Ok(loaded) => tracing::info!("Serving model {}", loaded.path.display()),
            Err(e) => tracing::warn!(
                "No model loaded at startup ({}); /predict will retry on first request",
                e
            ),
        }

        // ── Step 3: Serve ────────────────────────────────────────────────────
        let app = api::router(service);
        let listener = TcpListener::bind((cfg.host.as_str(), cfg.port))
            .await
            .with_context(|| format!("failed to bind {}:{}", cfg.host, cfg.port))?;

        tracing::info!(
            "nimbusops v{} listening on {}",
            env!("CARGO_PKG_VERSION"),
            listener.local_addr()?
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
