// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage and repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use outreach_config::model::StorageConfig;
use outreach_core::{
    AdapterType, CampaignCounters, CampaignStore, CampaignSummary, ConversationStore,
    ConversationThread, DispatchSettings, FailureUpdate, HealthStatus, MessageLogEntry,
    NewLogEntry, NewMessage, OutreachError, PluginAdapter, QueueMessage, QueueStore,
    SenderIdentity, SenderStore, SentUpdate, SettingsStore, StorageAdapter, ThreadUpsert,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
/// The database is opened by [`StorageAdapter::initialize`], which also seeds
/// the settings record when none exists.
pub struct SqliteStorage {
    config: StorageConfig,
    seed_settings: DispatchSettings,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The database is not opened until [`initialize`](StorageAdapter::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            seed_settings: DispatchSettings::default(),
            db: OnceCell::new(),
        }
    }

    /// Settings written on first open if the record does not exist yet.
    pub fn with_seed_settings(mut self, settings: DispatchSettings) -> Self {
        self.seed_settings = settings;
        self
    }

    /// Open and initialize a store at `path` in one step.
    pub async fn open(path: &str, seed: DispatchSettings) -> Result<Self, OutreachError> {
        let storage = Self::new(StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        })
        .with_seed_settings(seed);
        storage.initialize().await?;
        Ok(storage)
    }

    fn db(&self) -> Result<&Database, OutreachError> {
        self.db.get().ok_or_else(|| OutreachError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), OutreachError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, OutreachError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OutreachError> {
        if self.db.get().is_some() {
            self.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), OutreachError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        if queries::settings::seed_settings(&db, &self.seed_settings).await? {
            info!(
                batch_size = self.seed_settings.batch_size,
                global_daily_limit = self.seed_settings.global_daily_limit,
                "dispatch settings seeded from configuration"
            );
        }
        self.db.set(db).map_err(|_| OutreachError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), OutreachError> {
        self.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl QueueStore for SqliteStorage {
    async fn enqueue(
        &self,
        msg: &NewMessage,
        default_max_attempts: u32,
    ) -> Result<QueueMessage, OutreachError> {
        queries::queue::enqueue(self.db()?, msg, default_max_attempts).await
    }

    async fn get_message(&self, id: &str) -> Result<Option<QueueMessage>, OutreachError> {
        queries::queue::get_message(self.db()?, id).await
    }

    async fn count_sent_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, OutreachError> {
        queries::queue::count_sent_between(self.db()?, start, end).await
    }

    async fn select_eligible(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<QueueMessage>, OutreachError> {
        queries::queue::select_eligible(self.db()?, now, limit).await
    }

    async fn try_lease(&self, id: &str, until: DateTime<Utc>) -> Result<bool, OutreachError> {
        queries::queue::try_lease(self.db()?, id, until).await
    }

    async fn release_lease(&self, id: &str) -> Result<(), OutreachError> {
        queries::queue::release_lease(self.db()?, id).await
    }

    async fn release_expired_leases(&self, now: DateTime<Utc>) -> Result<u64, OutreachError> {
        queries::queue::release_expired_leases(self.db()?, now).await
    }

    async fn mark_sent(&self, id: &str, update: &SentUpdate) -> Result<bool, OutreachError> {
        queries::queue::mark_sent(self.db()?, id, update).await
    }

    async fn record_failure(
        &self,
        id: &str,
        update: &FailureUpdate,
    ) -> Result<bool, OutreachError> {
        queries::queue::record_failure(self.db()?, id, update).await
    }
}

#[async_trait]
impl SenderStore for SqliteStorage {
    async fn eligible_senders(&self) -> Result<Vec<SenderIdentity>, OutreachError> {
        queries::senders::eligible_senders(self.db()?).await
    }

    async fn record_usage(
        &self,
        sender_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), OutreachError> {
        queries::senders::record_usage(self.db()?, sender_id, at).await
    }

    async fn upsert_sender(&self, sender: &SenderIdentity) -> Result<(), OutreachError> {
        queries::senders::upsert_sender(self.db()?, sender).await
    }

    async fn get_sender(&self, sender_id: &str) -> Result<Option<SenderIdentity>, OutreachError> {
        queries::senders::get_sender(self.db()?, sender_id).await
    }
}

#[async_trait]
impl ConversationStore for SqliteStorage {
    async fn upsert_thread(&self, upsert: &ThreadUpsert) -> Result<String, OutreachError> {
        queries::conversations::upsert_thread(self.db()?, upsert).await
    }

    async fn append_log_entry(&self, entry: &NewLogEntry) -> Result<String, OutreachError> {
        queries::conversations::append_log_entry(self.db()?, entry).await
    }

    async fn get_thread_by_address(
        &self,
        address: &str,
    ) -> Result<Option<ConversationThread>, OutreachError> {
        queries::conversations::get_thread_by_address(self.db()?, address).await
    }

    async fn list_log_entries(
        &self,
        thread_id: &str,
    ) -> Result<Vec<MessageLogEntry>, OutreachError> {
        queries::conversations::list_log_entries(self.db()?, thread_id).await
    }
}

#[async_trait]
impl CampaignStore for SqliteStorage {
    async fn recompute_counters(
        &self,
        campaign_id: &str,
    ) -> Result<CampaignCounters, OutreachError> {
        queries::campaigns::recompute_counters(self.db()?, campaign_id).await
    }

    async fn get_campaign(
        &self,
        campaign_id: &str,
    ) -> Result<Option<CampaignSummary>, OutreachError> {
        queries::campaigns::get_campaign(self.db()?, campaign_id).await
    }
}

#[async_trait]
impl SettingsStore for SqliteStorage {
    async fn load_settings(&self) -> Result<DispatchSettings, OutreachError> {
        queries::settings::load_settings(self.db()?)
            .await?
            .ok_or_else(|| OutreachError::Config("dispatch settings record is missing".into()))
    }

    async fn save_settings(&self, settings: &DispatchSettings) -> Result<(), OutreachError> {
        queries::settings::save_settings(self.db()?, settings).await
    }
}
