// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Rosary tracker.

use thiserror::Error;

/// The primary error type used across all Rosary crates.
#[derive(Debug, Error)]
pub enum RosaryError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Required content (a named prayer sequence, a mystery set, a prayer)
    /// is absent. Indicates a seeding defect and fails the request loudly.
    #[error("content not seeded: {0}")]
    ContentMissing(String),

    /// No mystery set is assigned to the given weekday.
    #[error("no mystery set defined for {day}")]
    NoMysteryToday { day: String },

    /// The recitation flow was reached without usable session progress.
    #[error("session state invalid: {0}")]
    SessionStateInvalid(String),

    /// Client IP could not be resolved to a region.
    #[error("geolocation lookup failed: {0}")]
    GeoLookup(String),

    /// User input rejected (registration form, login form).
    #[error("validation error: {0}")]
    Validation(String),

    /// Credentials missing or wrong.
    #[error("unauthorized")]
    Unauthorized,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RosaryError {
    /// Returns true for failures the request flow recovers from without
    /// surfacing an error page.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RosaryError::NoMysteryToday { .. }
                | RosaryError::SessionStateInvalid(_)
                | RosaryError::GeoLookup(_)
        )
    }
}
