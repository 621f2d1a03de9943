//! Heart Disease Pipeline - Main Entry Point
//!
//! `prepare` downloads and cleans the dataset, `train` fits and selects a
//! model, `serve` answers prediction requests over HTTP.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use heart_disease_pipeline::{
    api::{build_router, AppState},
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    data::preparation::load_raw,
    logging::init_tracing,
    pipeline::{prepare_from_raw, run_preparation, run_training},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "heart-disease-pipeline",
    version,
    about = "Train a heart disease classifier and serve risk predictions."
)]
struct Cli {
    /// Configuration file (optional; defaults apply when absent)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download, clean and summarize the dataset
    Prepare {
        /// Reuse the existing raw snapshot instead of downloading
        #[arg(long)]
        skip_download: bool,
    },
    /// Train both candidates, select the best and persist the artifacts
    Train,
    /// Start the prediction service
    Serve {
        /// Override the configured listen address
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from_path(&cli.config)?;
    init_tracing(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    match cli.command {
        Commands::Prepare { skip_download } => {
            let report = if skip_download {
                let raw = load_raw(&config.data.raw_path)?;
                prepare_from_raw(&config.data, &raw)?
            } else {
                run_preparation(&config).await?
            };
            info!(
                raw_rows = report.raw_rows,
                clean_rows = report.clean_rows,
                summary = %report.summary_path.display(),
                "Preparation complete"
            );
        }
        Commands::Train => {
            // CPU-bound; keep it off the async workers
            let outcome = tokio::task::spawn_blocking(move || run_training(&config))
                .await
                .context("Training task panicked")??;
            for candidate in &outcome.candidates {
                let m = candidate.report.metrics;
                info!(
                    model = %candidate.report.kind,
                    accuracy = m.accuracy,
                    precision = m.precision,
                    recall = m.recall,
                    roc_auc = m.roc_auc,
                    "Holdout metrics"
                );
            }
            info!(best_model = %outcome.best, "Best model committed");
        }
        Commands::Serve { listen } => {
            let addr = listen.unwrap_or_else(|| config.server.listen_addr.clone());
            let state = Arc::new(AppState::from_config(&config)?);
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            info!(addr = %addr, "Prediction service listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;
            info!("Prediction service stopped");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
