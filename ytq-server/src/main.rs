//! YTQ Server (ytq-server) - Main entry point
//!
//! Shared playback queue microservice: HTTP API, SSE events, SQLite
//! snapshots.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ytq_common::config::{resolve_config_path, TomlConfig};

use ytq_server::api::{self, AppContext};
use ytq_server::config::{CliOverrides, Config};
use ytq_server::db::{self, SqlitePersistence};
use ytq_server::persistence::PersistenceGateway;
use ytq_server::title::{OEmbedTitleResolver, SyntheticTitleResolver, TitleResolver};
use ytq_server::{QueueService, SharedState};

/// Command-line arguments for ytq-server
#[derive(Parser, Debug)]
#[command(name = "ytq-server")]
#[command(about = "Shared playback queue server")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "YTQ_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "YTQ_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "YTQ_DATABASE")]
    database: Option<PathBuf>,

    /// Host key for privileged endpoints
    #[arg(long, env = "YTQ_HOST_KEY", hide_env_values = true)]
    host_key: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "YTQ_CONFIG")]
    config: Option<PathBuf>,

    /// Skip network title lookups
    #[arg(long)]
    no_title_lookup: bool,

    /// Identify submitters by peer address, ignoring X-Forwarded-For
    #[arg(long)]
    ignore_forwarded_for: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so the configured level can apply
    let toml_config =
        TomlConfig::load_or_default(args.config.as_deref()).context("Failed to load config file")?;

    let default_filter = format!(
        "ytq_server={level},ytq_common={level},ytq={level},tower_http=info",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting YTQ Server (ytq-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match resolve_config_path(args.config.as_deref()) {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using built-in defaults"),
    }

    let config = Config::resolve(
        CliOverrides {
            port: args.port,
            bind_address: args.bind,
            database_path: args.database,
            host_key: args.host_key,
            no_title_lookup: args.no_title_lookup,
            ignore_forwarded_for: args.ignore_forwarded_for,
        },
        toml_config,
    );

    info!("Database path: {}", config.database_path.display());
    let pool = db::connect(&config.database_path)
        .await
        .context("Failed to open database")?;
    let gateway: Arc<dyn PersistenceGateway> = Arc::new(SqlitePersistence::new(pool));

    let titles: Arc<dyn TitleResolver> = if config.title_lookup {
        Arc::new(OEmbedTitleResolver::new().context("Failed to create title resolver")?)
    } else {
        info!("Title lookup disabled");
        Arc::new(SyntheticTitleResolver)
    };

    let state = Arc::new(SharedState::new());
    let service = Arc::new(QueueService::restore(config.default_policy, titles, gateway, state).await);

    if config.trust_forwarded_for {
        info!("Submitter identity taken from X-Forwarded-For when present");
    }
    let ctx = AppContext::new(Arc::clone(&service), config.host_key_hash.clone())
        .with_trust_forwarded_for(config.trust_forwarded_for);
    api::run(&config.bind_address, config.port, ctx, shutdown_signal())
        .await
        .context("Server error")?;

    service
        .persist_now()
        .await
        .context("Failed to save queue state")?;

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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
