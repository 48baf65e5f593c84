// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the authentication server.
use anyhow::Context;
use backend_lib::{config::Settings, router::create_router, AppState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Username/password authentication server
#[derive(Debug, Parser)]
#[command(name = "authgate", version, about)]
struct Cli {
    /// TOML config file; missing files fall back to defaults
    #[arg(short, long, default_value = backend_lib::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(short, long)]
    port: Option<u16>,

    /// Override `log_level`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(log_level) = cli.log_level {
        settings.log_level = log_level;
    }
    settings.validate()?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_lowercase())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::new(&settings).context("failed to build application state")?);
    let maintenance = state.spawn_maintenance();

    let app = create_router(Arc::clone(&state));

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for task in maintenance {
        task.abort();
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
