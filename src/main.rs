//! Kennel development proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────┐
//!                     │               DEV PROXY                   │
//!   Browser request   │  ┌─────────┐   ┌───────────┐              │
//!   ──────────────────┼─▶│  http   │──▶│  routing  │── /api ──────┼──▶ Backend
//!                     │  │ server  │   │ RuleTable │── /uploads ──┼──▶ (Flask)
//!                     │  └─────────┘   └─────┬─────┘              │
//!                     │                      │ no rule            │
//!                     │                      ▼                    │
//!                     │               static_dir / 404            │
//!                     └───────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use kennel_bridge::config::{load_config, validate_config, BridgeConfig, ConfigError};
use kennel_bridge::lifecycle::{wait_for_signal, Shutdown};
use kennel_bridge::observability::{logging, metrics};
use kennel_bridge::DevProxy;

#[derive(Parser)]
#[command(name = "kennel-bridge")]
#[command(about = "Development proxy forwarding API and upload traffic to the backend", long_about = None)]
#[command(version)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend origin for every rule, e.g. http://localhost:5000.
    #[arg(short, long)]
    target: Option<String>,

    /// Serve this directory for paths no rule claims.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

impl Args {
    fn resolve(&self) -> Result<BridgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => BridgeConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(target) = &self.target {
            config.retarget(target);
        }
        if let Some(dir) = &self.static_dir {
            config.static_dir = Some(dir.clone());
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.resolve()?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!("kennel-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rules = config.rules.len(),
        connect_timeout_secs = config.timeouts.connect_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse::<SocketAddr>()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let proxy = DevProxy::new(config)?;
    proxy.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
