// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and hands the work to Layer 2 (application).
//
//   1. `train`  — fit, evaluate, track and save a model version
//   2. `serve`  — run the HTTP prediction service
//   3. `latest` — show which artifact `serve` would load
//
// This layer is the only one that prints to stdout.

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, LatestArgs, ServeArgs, TrainArgs};

use crate::application::serve_use_case::ServeUseCase;
use crate::application::train_use_case::{TrainConfig, TrainUseCase};
use crate::data::loader::{CsvDataset, DemoDataset};
use crate::domain::traits::DatasetSource;
use crate::infra::artifact_store::ArtifactStore;
use crate::infra::tracking::TrackingTarget;

#[derive(Parser, Debug)]
#[command(
    name = "nimbusops",
    version,
    about = "Train a logistic-regression classifier, version it on disk, and serve it over HTTP."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Serve(args)  => run_serve(args),
            Commands::Latest(args) => run_latest(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let config = TrainConfig::from(&args);

    let source: Box<dyn DatasetSource> = match &args.data {
        Some(path) => Box::new(CsvDataset::new(path)),
        None       => Box::new(DemoDataset::new()),
    };
    let tracking = TrackingTarget::parse(&args.tracking_uri).into_sink();
    let store    = ArtifactStore::new(&args.models_dir);

    let outcome = TrainUseCase::new(config, source, store, tracking)
        .with_experiment(args.experiment)
        .execute()
        .context("training failed")?;

    println!("Accuracy: {:.4}", outcome.metrics.accuracy);
    println!("AUC:      {:.4}", outcome.metrics.auc);
    match &outcome.run_id {
        Some(id) => println!("Run id:   {id}"),
        None     => println!("Run id:   (not tracked)"),
    }
    println!("Saved model to {}", outcome.artifact_path.display());
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(ServeUseCase::new(args.into()).run())
}

fn run_latest(args: LatestArgs) -> Result<()> {
    let path = ArtifactStore::new(&args.models_dir).latest()?;
    println!("{}", path.display());
    Ok(())
}
