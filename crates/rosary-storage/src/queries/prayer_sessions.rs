// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion history: append-only records of finished recitations.

use chrono::{DateTime, Utc};
use rosary_core::RosaryError;
use rosary_core::types::format_timestamp;
use rusqlite::{Connection, params};

use crate::database::{Database, map_tr_err};
use crate::models::{BucketCount, CompletionStats};

/// Append a completed recitation. Returns the new record id.
pub async fn record_completion(
    db: &Database,
    user_id: i64,
    mystery: &str,
    at: DateTime<Utc>,
) -> Result<i64, RosaryError> {
    let mystery = mystery.to_string();
    let started_at = format_timestamp(at);
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO prayer_sessions (user_id, mystery, completed, started_at)
                 VALUES (?1, ?2, 1, ?3)",
                params![user_id, mystery, started_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Completed-recitation counts for `user_id` by day, month and mystery,
/// plus global counts by day and month. Buckets are key-ordered.
pub async fn completion_stats(
    db: &Database,
    user_id: i64,
) -> Result<CompletionStats, RosaryError> {
    db.connection()
        .call(move |conn| -> Result<CompletionStats, rusqlite::Error> {
            Ok(CompletionStats {
                user_days: buckets(conn, "substr(started_at, 1, 10)", Some(user_id))?,
                user_months: buckets(conn, "substr(started_at, 1, 7)", Some(user_id))?,
                user_mysteries: buckets(conn, "mystery", Some(user_id))?,
                global_days: buckets(conn, "substr(started_at, 1, 10)", None)?,
                global_months: buckets(conn, "substr(started_at, 1, 7)", None)?,
            })
        })
        .await
        .map_err(map_tr_err)
}

// `key_expr` is one of a fixed set of column expressions, never user input.
fn buckets(
    conn: &Connection,
    key_expr: &str,
    user_id: Option<i64>,
) -> Result<Vec<BucketCount>, rusqlite::Error> {
    let sql = format!(
        "SELECT {key_expr} AS bucket, COUNT(*) FROM prayer_sessions
         WHERE completed = 1 AND (?1 IS NULL OR user_id = ?1)
         GROUP BY bucket ORDER BY bucket ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(BucketCount {
            key: row.get(0)?,
            count: row.get::<_, i64>(1)? as u64,
        })
    })?;
    rows.collect()
}
