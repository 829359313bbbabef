//! Codesketch server - prompt to code, diagram and analysis over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use codesketch_core::InteractionStore;
use codesketch_server::{config, logging, routes, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use logging::LogArgs;
use state::AppState;

/// Codesketch server - generate code and architecture diagrams from prompts.
#[derive(Parser, Debug)]
#[command(name = "codesketch-server")]
#[command(about = "HTTP server turning prompts into code, diagrams and code analysis")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override bind host
    #[arg(long)]
    host: Option<String>,

    /// Override port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override SQLite database path
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log);

    // File, then environment, then CLI flags
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database) = cli.database {
        config.db_path = database;
    }

    tracing::info!(target: "codesketch::startup", "Loaded configuration: {:?}", config);

    let db_path = config.resolve_db_path();
    let store = Arc::new(
        InteractionStore::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?,
    );
    tracing::info!(target: "codesketch::startup", "Opened interaction store at {}", db_path.display());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config, store.clone())?);
    let models = state.orchestrator.models();
    tracing::info!(
        target: "codesketch::startup",
        code_model = %models.code_model_id,
        diagram_model = %models.diagram_model_id,
        "Model selection"
    );
    let app = routes::router(state.clone());

    tracing::info!(target: "codesketch::startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release every handle so the store can be closed explicitly
    drop(state);
    match Arc::try_unwrap(store) {
        Ok(store) => {
            store.close()?;
            tracing::info!(target: "codesketch::startup", "Closed interaction store");
        }
        Err(_) => {
            tracing::warn!(target: "codesketch::startup", "Interaction store still shared at shutdown");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "codesketch::startup", "Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "codesketch::startup", "Shutdown signal received");
}
