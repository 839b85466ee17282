//! Domain Warden daemon.
//!
//! Opens the SQLite store, connects to PowerDNS, and runs the periodic health
//! scanner until Ctrl-C.
//!
//! ```bash
//! domain-warden /etc/domain-warden.toml
//! DOMAIN_WARDEN_CONFIG=/etc/domain-warden.toml domain-warden
//! ```

mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use domain_warden_app::AppStateBuilder;
use domain_warden_app::adapters::{SqliteStore, TelegramNotifier};
use domain_warden_provider::PowerDnsProvider;

use config::{CONFIG_PATH_ENV, DaemonConfig};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("domain-warden: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let (config_path, explicit) =
        config::resolve_path(std::env::args().nth(1), std::env::var(CONFIG_PATH_ENV).ok());
    let config = DaemonConfig::load(&config_path, explicit)?;
    let _log_guard = logging::init(&config.logging).context("Failed to initialise logging")?;

    info!(
        "Starting Domain Warden {} (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );
    if !explicit && !config_path.exists() {
        warn!("No config file found, running with defaults");
    }

    let store = Arc::new(
        SqliteStore::new(&config.database.path)
            .await
            .context("Failed to open database")?,
    );
    let zone_provider = Arc::new(PowerDnsProvider::new(config.powerdns.clone()));
    let notifier = TelegramNotifier::new(config.telegram.clone());
    if !notifier.is_configured() {
        info!("Telegram not configured, notifications disabled");
    }

    let state = AppStateBuilder::new()
        .sqlite_store(store)
        .zone_provider(zone_provider)
        .notifier(Arc::new(notifier))
        .scanner_config(config.scanner.clone())
        .lifecycle_policy(config.lifecycle.clone())
        .threat_intel_config(config.threat_intel.clone())
        .build()?;
    state.run_startup().await;

    let scanner = Arc::clone(&state.scan_service);
    let mut driver = tokio::spawn(async move { scanner.run_periodic().await });

    let stop = tokio::select! {
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("Ctrl-C received, stopping");
                true
            }
            Err(e) => {
                warn!("Failed to listen for Ctrl-C, running until the driver exits: {e}");
                false
            }
        },
        result = &mut driver => {
            result.context("Scan driver panicked")?;
            warn!("Scan driver exited on its own");
            return Ok(());
        }
    };

    if stop {
        state.shutdown();
    }
    driver.await.context("Scan driver panicked")?;
    info!("Domain Warden stopped");
    Ok(())
}
