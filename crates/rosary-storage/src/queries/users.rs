// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registered accounts.

use chrono::{DateTime, Utc};
use rosary_core::RosaryError;
use rosary_core::types::format_timestamp;
use rusqlite::{ErrorCode, OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{User, UserCredentials};

/// Insert a new account. A taken username is a `Validation` error.
pub async fn create_user(
    db: &Database,
    username: &str,
    password_hash: &str,
    at: DateTime<Utc>,
) -> Result<User, RosaryError> {
    let username = username.to_string();
    let password_hash = password_hash.to_string();
    let created_at = format_timestamp(at);
    let taken = username.clone();

    db.connection()
        .call(move |conn| -> Result<User, rusqlite::Error> {
            conn.execute(
                "INSERT INTO users (username, password_hash, created_at)
                 VALUES (?1, ?2, ?3)",
                params![username, password_hash, created_at],
            )?;
            Ok(User {
                id: conn.last_insert_rowid(),
                username,
                created_at,
            })
        })
        .await
        .map_err(|e| match &e {
            tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                RosaryError::Validation(format!("username `{taken}` is already taken"))
            }
            _ => map_tr_err(e),
        })
}

/// Look up an account and its stored credential material.
pub async fn find_credentials(
    db: &Database,
    username: &str,
) -> Result<Option<UserCredentials>, RosaryError> {
    let username = username.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<UserCredentials>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, username, created_at, password_hash FROM users
                 WHERE username = ?1",
                params![username],
                |row| {
                    Ok(UserCredentials {
                        user: User {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            created_at: row.get(2)?,
                        },
                        password_hash: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Find an account by username, creating it with the given credential
/// material if absent. Used by demo seeding.
pub async fn ensure_user(
    db: &Database,
    username: &str,
    password_hash: &str,
    at: DateTime<Utc>,
) -> Result<User, RosaryError> {
    let username = username.to_string();
    let password_hash = password_hash.to_string();
    let created_at = format_timestamp(at);
    db.connection()
        .call(move |conn| -> Result<User, rusqlite::Error> {
            conn.execute(
                "INSERT INTO users (username, password_hash, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO NOTHING",
                params![username, password_hash, created_at],
            )?;
            conn.query_row(
                "SELECT id, username, created_at FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}
