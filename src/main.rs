//! CMS Content Router
//!
//! Front end that sits before a web application and, for every request,
//! decides whether published CMS content, a CMS redirect, or the application
//! itself should answer it.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────────┐
//!                      │                    CMS ROUTER                       │
//!                      │                                                     │
//!   Client Request     │  ┌────────┐    ┌──────────────┐    ┌─────────────┐  │
//!   ───────────────────┼─▶│  http  │───▶│   routing    │───▶│   content   │──┼──▶ Content
//!                      │  │ server │    │    engine    │    │probe/listing│  │    Store
//!                      │  └───┬────┘    └──────┬───────┘    └─────────────┘  │
//!                      │      │                │                             │
//!                      │      │        RoutingDecision                       │
//!                      │      ▼                ▼                             │
//!   Client Response    │  ┌─────────────────────────────┐                    │
//!   ◀──────────────────┼──│ 301/302 Location  |  forward │───────────────────┼──▶ Hosting
//!                      │  └─────────────────────────────┘                    │    Application
//!                      │                                                     │
//!                      │  config (TOML, hot reload) · observability · lifecycle
//!                      └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use cms_router::config::loader::{apply_env_overrides, finalize, load_config};
use cms_router::config::watcher::ConfigWatcher;
use cms_router::config::CmsConfig;
use cms_router::http::HttpServer;
use cms_router::lifecycle::{signals, Shutdown};
use cms_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "cms-router")]
#[command(about = "Routes requests to published CMS content, CMS redirects, or the application", long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, env = "CMS_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload the routing engine when the config file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Fail fast: a missing content root aborts before anything is bound
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = CmsConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            finalize(config)?
        }
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        config = finalize(config)?;
    }

    logging::init_logging(&config.observability);
    tracing::info!("cms-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        content_root = %config.content.content_root,
        upstream = %config.upstream.app_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
