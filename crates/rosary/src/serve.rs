// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rosary serve` command implementation.

use std::sync::Arc;

use rosary_config::RosaryConfig;
use rosary_core::{PluginAdapter, RosaryError, StorageAdapter};
use rosary_gateway::{AppState, GatewaySettings, build_locator, start_server};
use rosary_storage::SqliteStorage;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `rosary serve` command.
///
/// Opens storage, selects the geolocation provider, and serves HTTP until
/// SIGINT or SIGTERM. Storage is flushed and closed on the way out.
pub async fn run_serve(config: RosaryConfig) -> Result<(), RosaryError> {
    init_tracing(&config.server.log_level);

    info!("starting rosary serve");

    let storage = open_storage(&config).await?;

    let geo = build_locator(&config.geo)?;
    match geo.health_check().await {
        Ok(status) => info!(provider = geo.name(), ?status, "geolocation ready"),
        Err(e) => warn!(provider = geo.name(), error = %e, "geolocation health check failed"),
    }

    let state = AppState::new(storage.clone(), geo, GatewaySettings::from_config(&config));

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&config.server.host, config.server.port, state, async move {
        cancel.cancelled().await;
    })
    .await;

    if let Err(e) = storage.close().await {
        warn!(error = %e, "failed to close storage cleanly");
    }
    served?;

    info!("rosary serve shutdown complete");
    Ok(())
}

/// Open and migrate the configured SQLite database.
pub async fn open_storage(config: &RosaryConfig) -> Result<Arc<SqliteStorage>, RosaryError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");
    Ok(Arc::new(storage))
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rosary={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
