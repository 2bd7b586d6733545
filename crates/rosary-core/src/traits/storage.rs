// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::RosaryError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ActiveSummary, CompletionStats, ContentSnapshot, GeoLocation, MysterySet, RegionCount, User,
    UserCredentials,
};

/// Adapter for the relational persistence collaborator.
///
/// Holds the content model, completion history, the per-user presence
/// row, and registered accounts.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), RosaryError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), RosaryError>;

    // --- Content ---

    /// Loads the full content model as it is right now.
    async fn load_content(&self) -> Result<ContentSnapshot, RosaryError>;

    /// Lists mystery sets in ascending id order.
    async fn list_mystery_sets(&self) -> Result<Vec<MysterySet>, RosaryError>;

    // --- Completion history ---

    /// Appends a completed recitation for `user_id`. Returns the record id.
    async fn record_completion(
        &self,
        user_id: i64,
        mystery: &str,
        at: DateTime<Utc>,
    ) -> Result<i64, RosaryError>;

    /// Per-user and global completion counts.
    async fn completion_stats(&self, user_id: i64) -> Result<CompletionStats, RosaryError>;

    // --- Presence ---

    /// Upserts the single presence row for `user_id`.
    async fn record_activity(
        &self,
        user_id: i64,
        location: &GeoLocation,
        at: DateTime<Utc>,
    ) -> Result<(), RosaryError>;

    /// Count and distinct regions of users active within `window` of `now`.
    async fn count_active_since(
        &self,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<ActiveSummary, RosaryError>;

    /// Active users per region within `window` of `now`.
    async fn region_histogram_since(
        &self,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Vec<RegionCount>, RosaryError>;

    // --- Accounts ---

    /// Creates an account. Fails with `Validation` if the username is taken.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RosaryError>;

    /// Looks up stored credentials by username.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RosaryError>;
}
