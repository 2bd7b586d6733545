// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use rosary_config::model::StorageConfig;
use rosary_core::types::{
    ActiveSummary, CompletionStats, ContentSnapshot, GeoLocation, MysterySet, RegionCount, User,
    UserCredentials,
};
use rosary_core::{AdapterType, HealthStatus, PluginAdapter, RosaryError, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call
/// to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, RosaryError> {
        self.db.get().ok_or_else(|| RosaryError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), RosaryError> {
        self.database()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RosaryError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RosaryError> {
        if self.db.get().is_some() {
            self.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), RosaryError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| RosaryError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RosaryError> {
        self.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Content ---

    async fn load_content(&self) -> Result<ContentSnapshot, RosaryError> {
        queries::content::load_content(self.database()?).await
    }

    async fn list_mystery_sets(&self) -> Result<Vec<MysterySet>, RosaryError> {
        queries::content::list_mystery_sets(self.database()?).await
    }

    // --- Completion history ---

    async fn record_completion(
        &self,
        user_id: i64,
        mystery: &str,
        at: DateTime<Utc>,
    ) -> Result<i64, RosaryError> {
        queries::prayer_sessions::record_completion(self.database()?, user_id, mystery, at).await
    }

    async fn completion_stats(&self, user_id: i64) -> Result<CompletionStats, RosaryError> {
        queries::prayer_sessions::completion_stats(self.database()?, user_id).await
    }

    // --- Presence ---

    async fn record_activity(
        &self,
        user_id: i64,
        location: &GeoLocation,
        at: DateTime<Utc>,
    ) -> Result<(), RosaryError> {
        queries::activity::record(self.database()?, user_id, location, at).await
    }

    async fn count_active_since(
        &self,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<ActiveSummary, RosaryError> {
        queries::activity::count_active_since(self.database()?, window, now).await
    }

    async fn region_histogram_since(
        &self,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Vec<RegionCount>, RosaryError> {
        queries::activity::region_histogram_since(self.database()?, window, now).await
    }

    // --- Accounts ---

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RosaryError> {
        queries::users::create_user(self.database()?, username, password_hash, at).await
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RosaryError> {
        queries::users::find_credentials(self.database()?, username).await
    }
}
