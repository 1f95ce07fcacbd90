//! wastecast: food waste category prediction server
//!
//! Main entry point: loads the fitted artifacts and serves the form.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wastecast::adapters::artifacts::verifying_key_from_b64;
use wastecast::adapters::sanitize::SanitizingMakeWriter;
use wastecast::adapters::ArtifactLoader;
use wastecast::application::PredictionService;
use wastecast::config::{AppConfig, LogMode, LogSettings};
use wastecast::web;

#[tokio::main]
async fn main() -> Result<()> {
    let log = LogSettings::from_env();

    let (writer, _guard) = match log.mode {
        LogMode::File => {
            if let Some(parent) = log.file.parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log.file)
                .with_context(|| format!("failed to open log file {:?}", log.file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting wastecast...");
    for warning in &log.warnings {
        tracing::warn!("{}", warning);
    }

    let config = AppConfig::from_env();

    let mut loader = ArtifactLoader::new().require_signed(config.require_signed_artifacts);
    if let Some(b64) = &config.artifact_pubkey_b64 {
        loader = loader.with_verifying_key(
            verifying_key_from_b64(b64).context("invalid artifact verifying key")?,
        );
    }

    // Missing or corrupt artifacts are fatal.
    let artifacts = loader
        .load(&config.scaler_path, &config.model_path)
        .context("failed to load model artifacts")?;

    let service = PredictionService::new(
        Arc::new(artifacts.scaler),
        Arc::new(artifacts.classifier),
    );
    for warning in service.compatibility_warnings() {
        tracing::warn!("Artifact compatibility: {}", warning);
    }

    let app = web::router(service).context("failed to compile templates")?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("wastecast listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("wastecast shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
