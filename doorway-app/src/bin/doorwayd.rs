//! doorwayd: runs the reconciliation sweep against the local database until
//! Ctrl-C.
//!
//! Usage: `doorwayd [config.toml]` (or `DOORWAY_CONFIG`). Without a config
//! file the defaults are used and the key must come from `DOORWAY_MASTER_KEY`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use doorway_app::AppStateBuilder;
use doorway_app::adapters::SqliteStore;
use doorway_app::config::{AppConfig, LoggingSection};
use doorway_core::certificates::CaddyCertificateManager;

const DEFAULT_CONFIG: &str = "doorway.toml";

fn load_config() -> Result<AppConfig> {
    let explicit = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("DOORWAY_CONFIG").map(PathBuf::from));

    match explicit {
        Some(path) => Ok(AppConfig::from_file(&path)?),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG);
            if path.exists() {
                Ok(AppConfig::from_file(&path)?)
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}

fn init_tracing(logging: &LoggingSection) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid logging.level")?;

    let fmt_layer = if logging.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };

    // `log` records from the library crates are forwarded through tracing-log
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    init_tracing(&config.logging)?;

    tracing::info!("Starting doorwayd");

    let key_ring = config.key_ring().context("loading credential key")?;
    let store = SqliteStore::new(&config.database.path)
        .await
        .with_context(|| format!("opening {}", config.database.path.display()))?;
    let caddy = CaddyCertificateManager::new(
        config.caddy.sites_dir.clone(),
        config.caddy.reload_command.clone(),
    );

    let state = AppStateBuilder::new()
        .sqlite_store(Arc::new(store))
        .certificate_manager(Arc::new(caddy))
        .key_ring(key_ring)
        .provisioning_config(config.provisioning_config())
        .sweep_config(config.sweep_config())
        .build()?;

    state.run_startup().await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = match config.sweep_interval() {
        Some(every) => Some(state.spawn_sweep(every, shutdown_rx)),
        None => {
            tracing::warn!("reconciliation.interval_secs = 0, sweep disabled");
            None
        }
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("Shutdown requested, waiting for the current sweep to finish");

    // 接收端已退出时 send 会失败，无需处理
    let _ = shutdown_tx.send(true);
    if let Some(handle) = sweep {
        handle.await.context("sweep task panicked")?;
    }

    tracing::info!("doorwayd stopped");
    Ok(())
}
