//! heartscore: Heart disease prediction API
//!
//! Main entry point for the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use heartscore::adapters::sanitize::SanitizingMakeWriter;
use heartscore::api::build_router;
use heartscore::config::{LogFormat, LogMode, LoggingConfig, ServerConfig};
use heartscore::startup::build_state;

fn init_logging(config: &LoggingConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let (writer, guard) = match config.mode {
        LogMode::File => {
            if let Some(parent) = config.file.parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.file)
                .with_context(|| format!("opening log file {:?}", config.file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let writer = SanitizingMakeWriter::new(writer);
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init(),
    }

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    let _guard = init_logging(&config.logging)?;

    tracing::info!("Starting heartscore {}...", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Configuration: {:?}", config);

    let state = build_state(&config)
        .await
        .context("model artifact could not be loaded")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("Listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("heartscore shutdown complete.");
    Ok(())
}
