// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read access to the reference content model.
//!
//! Content is loaded whole on every request; nothing here caches.

use std::collections::BTreeMap;

use rosary_core::RosaryError;
use rusqlite::{Connection, params};

use crate::database::{Database, map_tr_err};
use crate::models::{ContentSnapshot, Mystery, MysterySet, Prayer, PrayerSequence, Step};

/// Load every prayer, sequence, mystery set and mystery with their steps.
///
/// Steps come back in ascending `order`; mysteries in ascending id.
pub async fn load_content(db: &Database) -> Result<ContentSnapshot, RosaryError> {
    db.connection()
        .call(|conn| -> Result<ContentSnapshot, rusqlite::Error> {
            let tx = conn.transaction()?;
            let snapshot = ContentSnapshot {
                prayers: load_prayers(&tx)?,
                sequences: load_sequences(&tx)?,
                mystery_sets: load_mystery_sets(&tx)?,
                mysteries: load_mysteries(&tx)?,
            };
            tx.commit()?;
            Ok(snapshot)
        })
        .await
        .map_err(map_tr_err)
}

/// List mystery sets in ascending id order.
pub async fn list_mystery_sets(db: &Database) -> Result<Vec<MysterySet>, RosaryError> {
    db.connection()
        .call(|conn| -> Result<Vec<MysterySet>, rusqlite::Error> { load_mystery_sets(conn) })
        .await
        .map_err(map_tr_err)
}

fn load_prayers(conn: &Connection) -> Result<BTreeMap<i64, Prayer>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT id, name, text FROM prayers ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Prayer {
            id: row.get(0)?,
            name: row.get(1)?,
            text: row.get(2)?,
        })
    })?;
    let mut prayers = BTreeMap::new();
    for row in rows {
        let prayer = row?;
        prayers.insert(prayer.id, prayer);
    }
    Ok(prayers)
}

fn load_sequences(conn: &Connection) -> Result<Vec<PrayerSequence>, rusqlite::Error> {
    let mut sequences: Vec<PrayerSequence> = conn
        .prepare("SELECT id, name FROM prayer_sequences ORDER BY id")?
        .query_map([], |row| {
            Ok(PrayerSequence {
                id: row.get(0)?,
                name: row.get(1)?,
                steps: Vec::new(),
            })
        })?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT step_order, prayer_id, repeat FROM prayer_sequence_steps
         WHERE sequence_id = ?1 ORDER BY step_order ASC",
    )?;
    for sequence in &mut sequences {
        sequence.steps = stmt
            .query_map(params![sequence.id], row_to_step)?
            .collect::<Result<_, _>>()?;
    }
    Ok(sequences)
}

fn load_mystery_sets(conn: &Connection) -> Result<Vec<MysterySet>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT id, name, days FROM mystery_sets ORDER BY id ASC")?;
    let sets = stmt
        .query_map([], |row| {
            Ok(MysterySet {
                id: row.get(0)?,
                name: row.get(1)?,
                days: row.get(2)?,
            })
        })?
        .collect::<Result<_, _>>()?;
    Ok(sets)
}

fn load_mysteries(conn: &Connection) -> Result<Vec<Mystery>, rusqlite::Error> {
    let mut mysteries: Vec<Mystery> = conn
        .prepare(
            "SELECT id, set_id, title, scripture_reference FROM mysteries
             ORDER BY set_id ASC, id ASC",
        )?
        .query_map([], |row| {
            Ok(Mystery {
                id: row.get(0)?,
                set_id: row.get(1)?,
                title: row.get(2)?,
                scripture_reference: row.get(3)?,
                steps: Vec::new(),
            })
        })?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT step_order, prayer_id, repeat FROM decade_steps
         WHERE mystery_id = ?1 ORDER BY step_order ASC",
    )?;
    for mystery in &mut mysteries {
        mystery.steps = stmt
            .query_map(params![mystery.id], row_to_step)?
            .collect::<Result<_, _>>()?;
    }
    Ok(mysteries)
}

fn row_to_step(row: &rusqlite::Row<'_>) -> Result<Step, rusqlite::Error> {
    Ok(Step {
        order: row.get(0)?,
        prayer_id: row.get(1)?,
        repeat: row.get(2)?,
    })
}
