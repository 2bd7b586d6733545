// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence tracking: one row per user, upserted on every authenticated
//! request and aggregated over trailing minute windows.

use chrono::{DateTime, TimeDelta, Utc};
use rosary_core::RosaryError;
use rosary_core::types::format_timestamp;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{ActiveSummary, GeoLocation, RegionCount};

/// Upsert the presence row for `user_id`. Last write wins.
pub async fn record(
    db: &Database,
    user_id: i64,
    location: &GeoLocation,
    at: DateTime<Utc>,
) -> Result<(), RosaryError> {
    let location = location.clone();
    let last_active = format_timestamp(at);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO prayer_activity (user_id, region, lat, lng, last_active)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                     region = excluded.region,
                     lat = excluded.lat,
                     lng = excluded.lng,
                     last_active = excluded.last_active",
                params![
                    user_id,
                    location.region,
                    location.lat,
                    location.lng,
                    last_active
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of users active within `window` before `now`, plus their
/// distinct regions in sorted order.
pub async fn count_active_since(
    db: &Database,
    window: TimeDelta,
    now: DateTime<Utc>,
) -> Result<ActiveSummary, RosaryError> {
    let cutoff = format_timestamp(now - window);
    db.connection()
        .call(move |conn| -> Result<ActiveSummary, rusqlite::Error> {
            let tx = conn.transaction()?;
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM prayer_activity WHERE last_active >= ?1",
                params![cutoff],
                |row| row.get(0),
            )?;
            let regions = {
                let mut stmt = tx.prepare(
                    "SELECT DISTINCT region FROM prayer_activity
                     WHERE last_active >= ?1 ORDER BY region ASC",
                )?;
                let rows = stmt.query_map(params![cutoff], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            tx.commit()?;
            Ok(ActiveSummary {
                count: count as u64,
                regions,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Active users per region within `window` before `now`, sorted by region.
pub async fn region_histogram_since(
    db: &Database,
    window: TimeDelta,
    now: DateTime<Utc>,
) -> Result<Vec<RegionCount>, RosaryError> {
    let cutoff = format_timestamp(now - window);
    db.connection()
        .call(move |conn| -> Result<Vec<RegionCount>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT region, COUNT(*) FROM prayer_activity
                 WHERE last_active >= ?1
                 GROUP BY region ORDER BY region ASC",
            )?;
            let rows = stmt.query_map(params![cutoff], |row| {
                Ok(RegionCount {
                    region: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?;
            let histogram = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(histogram)
        })
        .await
        .map_err(map_tr_err)
}
