//! crew-hub - ClassCrew roster hub service
//!
//! Keeps the live study-group roster synchronized with the backing document
//! store and serves it over REST and SSE.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crew_common::config::HubConfig;
use crew_common::events::EventBus;
use crew_hub::roster::spawn_roster_hub;
use crew_hub::state::AppState;
use crew_hub::store::SqliteStore;
use crew_hub::server;

/// Command-line arguments for crew-hub
#[derive(Parser, Debug)]
#[command(name = "crew-hub")]
#[command(about = "Live study-group roster hub for ClassCrew")]
#[command(version)]
struct Args {
    /// Bind host
    #[arg(long, env = "CLASSCREW_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CLASSCREW_PORT")]
    port: Option<u16>,

    /// SQLite document store location
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crew_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting ClassCrew roster hub v{}", env!("CARGO_PKG_VERSION"));

    let config = HubConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(args.host, args.port, args.database);
    config
        .ensure_data_dir()
        .context("Failed to create data directory")?;

    info!("Database path: {}", config.database_path.display());

    let store = SqliteStore::open(&config.database_path)
        .await
        .context("Failed to open document store")?;

    let bus = Arc::new(EventBus::new(config.event_capacity));
    let state = AppState::new(store, bus);

    // Keep the subscription handle alive for the process lifetime; dropping
    // it would silence the roster.
    let _roster = spawn_roster_hub(state.clone());

    let bind_addr = config.bind_addr();
    tokio::select! {
        result = server::start(&bind_addr, state) => result?,
        _ = shutdown_signal() => info!("Shutdown signal received"),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
