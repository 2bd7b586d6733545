// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maintenance subcommands: seeding and config inspection.

use chrono::Utc;
use rosary_config::RosaryConfig;
use rosary_core::{RosaryError, StorageAdapter};
use rosary_storage::seed::{seed_demo_activity, seed_rosary_content};

use crate::serve::{init_tracing, open_storage};

/// `rosary seed`: upsert the canonical content. Safe to re-run.
pub async fn run_seed(config: RosaryConfig) -> Result<(), RosaryError> {
    init_tracing(&config.server.log_level);
    let storage = open_storage(&config).await?;

    let report = seed_rosary_content(storage.database()?).await?;
    storage.close().await?;

    println!(
        "seeded {} prayers, {} mystery sets, {} mysteries",
        report.prayers, report.mystery_sets, report.mysteries
    );
    Ok(())
}

/// `rosary seed-activity`: demo users active within the last quarter hour.
pub async fn run_seed_activity(config: RosaryConfig) -> Result<(), RosaryError> {
    init_tracing(&config.server.log_level);
    let storage = open_storage(&config).await?;

    let seeded =
        seed_demo_activity(storage.database()?, Utc::now(), &mut rand::thread_rng()).await?;
    storage.close().await?;

    println!("seeded activity for {seeded} demo users");
    Ok(())
}

/// `rosary check-config`: the configuration already validated; show it.
pub fn print_config_summary(config: &RosaryConfig) {
    println!("config ok");
    println!("  listen:   {}:{}", config.server.host, config.server.port);
    println!(
        "  database: {} (wal: {})",
        config.storage.database_path, config.storage.wal_mode
    );
    println!(
        "  days:     {} match, utc offset {} min",
        config.rosary.day_match, config.rosary.utc_offset_minutes
    );
    println!(
        "  windows:  presence {} min, heatmap {} min",
        config.activity.presence_window_minutes, config.activity.heatmap_window_minutes
    );
    println!("  geo:      {:?}", config.geo.provider);
}
