//! gemcat-api - Catalog API server
//!
//! Serves the normalized inventory spreadsheet as paginated JSON at
//! `/api/diamonds`.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gemcat_api::ingest::SheetClient;
use gemcat_api::{build_router, AppState};
use gemcat_common::config::TomlConfig;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for gemcat-api
#[derive(Parser, Debug)]
#[command(name = "gemcat-api")]
#[command(about = "Catalog API server for the GemCat inventory browser")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "GEMCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long, env = "GEMCAT_BIND")]
    bind: Option<SocketAddr>,

    /// Spreadsheet identifier (overrides config)
    #[arg(long, env = "GEMCAT_SOURCE_ID")]
    source_id: Option<String>,

    /// Spreadsheet tab gid (overrides config)
    #[arg(long, env = "GEMCAT_SHEET_TAB")]
    sheet_tab: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_source) =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("gemcat_api={0},tower_http={0}", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GemCat catalog API v{}", env!("CARGO_PKG_VERSION"));
    config_source.log();

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(source_id) = args.source_id {
        config.sheet.source_id = source_id;
    }
    if let Some(sheet_tab) = args.sheet_tab {
        config.sheet.sheet_tab = sheet_tab;
    }
    config.sheet.validate().context("Invalid sheet configuration")?;

    let sheet = SheetClient::new(&config.sheet, config.request_timeout())
        .context("Failed to create sheet client")?;
    info!("Sheet export: {}", sheet.export_url());

    let app = build_router(AppState::new(sheet));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    info!("gemcat-api listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
