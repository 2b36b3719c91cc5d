//! `stowd` — the stow daemon.
//!
//! Binary entrypoint running one of two roles:
//!
//! ```text
//! stowd router                          # start the object router
//! stowd router -c stow.toml             # with a config file
//! stowd router -l 127.0.0.1:7070
//! stowd node -l 127.0.0.1:7071 -d ./node1
//! stowd node --memory                   # volatile storage node
//! ```
//!
//! A router process keeps a pool of storage nodes behind one object API,
//! placing each key on one backend. A node process serves a single local
//! store over the wire protocol routers speak.

mod config;
mod discovery;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use stow_cluster::{locator, Locator};
use stow_placement::{ConsistentRing, HashModulo, PlacementStrategy};
use stow_router::Distributor;
use stow_store::{FileStore, HttpStoreFactory, MemoryStore, ObjectStore};

use config::CliConfig;
use discovery::StaticDiscovery;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "stowd", version, about = "Stow object storage daemon")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the object router.
    Router {
        /// Override the object API listen address.
        #[arg(short = 'l', long)]
        listen_addr: Option<String>,
    },

    /// Start a storage node.
    Node {
        /// Override the node API listen address.
        #[arg(short = 'l', long)]
        listen_addr: Option<String>,

        /// Override the data directory.
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Keep objects in memory only (no disk persistence).
        #[arg(short, long)]
        memory: bool,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    match cli.command {
        Commands::Router { listen_addr } => {
            // CLI args override config file values.
            if let Some(addr) = listen_addr {
                config.router.listen_addr = addr;
            }
            cmd_router(config).await
        }
        Commands::Node {
            listen_addr,
            data_dir,
            memory,
        } => {
            if let Some(addr) = listen_addr {
                config.node.listen_addr = addr;
            }
            if let Some(dir) = data_dir {
                config.node.data_dir = dir;
            }
            if memory {
                config.node.backend = "memory".to_string();
            }
            cmd_node(config).await
        }
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
    }
}

// -----------------------------------------------------------------------
// stowd router
// -----------------------------------------------------------------------

/// Build the placement strategy named in the config.
fn build_strategy(config: &CliConfig) -> Result<Box<dyn PlacementStrategy>> {
    match config.router.strategy.as_str() {
        "ring" => Ok(Box::new(ConsistentRing::new(config.ring_config()))),
        "modulo" => Ok(Box::new(HashModulo::new())),
        other => anyhow::bail!("unknown placement strategy: {other}"),
    }
}

async fn cmd_router(config: CliConfig) -> Result<()> {
    info!("starting stow router");
    info!(
        addr = %config.router.listen_addr,
        strategy = %config.router.strategy,
        criteria = %config.router.criteria,
        configured_backends = config.backends.len(),
        "router configuration"
    );

    let strategy = build_strategy(&config)?;
    let distributor = Arc::new(Distributor::new(strategy));

    let discovery = Arc::new(StaticDiscovery::new(config.candidates()));
    let factory = Arc::new(HttpStoreFactory::new());
    let monitor = Locator::new(
        config.locator_config(),
        discovery,
        factory,
        distributor.clone(),
    );

    // One sweep before accepting traffic so a healthy static pool is
    // routable from the first request. Failures are not fatal here; the
    // loop keeps retrying.
    if let Err(error) = monitor.tick().await {
        warn!(%error, "initial membership sweep failed");
    }
    let locator_handle = locator::start(monitor);

    let app = stow_gateway::object_api(distributor);
    let listener = tokio::net::TcpListener::bind(&config.router.listen_addr)
        .await
        .context("failed to bind object API listener")?;
    info!(addr = %config.router.listen_addr, "object API ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("object API server failed")?;

    info!("shutting down locator");
    locator_handle.shutdown().await;

    Ok(())
}

// -----------------------------------------------------------------------
// stowd node
// -----------------------------------------------------------------------

async fn cmd_node(config: CliConfig) -> Result<()> {
    info!("starting stow storage node");
    info!(
        addr = %config.node.listen_addr,
        backend = %config.node.backend,
        data_dir = %config.node.data_dir.display(),
        "node configuration"
    );

    let store: Arc<dyn ObjectStore> = match config.node.backend.as_str() {
        "memory" => {
            info!("using in-memory object store");
            Arc::new(MemoryStore::new())
        }
        _ => {
            let path = config.node.data_dir.join("objects");
            info!(path = %path.display(), "using file object store");
            Arc::new(FileStore::new(&path).context("failed to initialize file store")?)
        }
    };

    let auth = config.node_auth();
    if auth.is_some() {
        info!("object routes require bearer credentials");
    }

    let app = stow_gateway::node_api(store, auth);
    let listener = tokio::net::TcpListener::bind(&config.node.listen_addr)
        .await
        .context("failed to bind node API listener")?;
    info!(addr = %config.node.listen_addr, "node API ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("node API server failed")?;

    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
