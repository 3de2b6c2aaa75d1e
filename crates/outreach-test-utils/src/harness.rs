// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end dispatch tests.
//!
//! `TestHarness` assembles a temp SQLite store, a [`MockTransport`], a
//! [`ManualClock`], and a [`DispatchRunner`] wired to all three.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};

use outreach_core::{
    DispatchSettings, NewMessage, OutreachError, QueueMessage, QueueStore, SenderIdentity,
    SenderStore,
};
use outreach_dispatch::{Clock, DispatchRunner, RetryPolicy, RunnerConfig};
use outreach_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    settings: DispatchSettings,
    senders: Vec<SenderIdentity>,
    policy: RetryPolicy,
    runner_config: RunnerConfig,
    transport: Option<MockTransport>,
    clock_start: DateTime<Utc>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            settings: DispatchSettings {
                delay_between_messages_ms: 0,
                ..DispatchSettings::default()
            },
            senders: Vec::new(),
            policy: RetryPolicy::default(),
            runner_config: RunnerConfig {
                transport_timeout: Duration::from_secs(5),
                lease_timeout: Duration::from_secs(300),
            },
            transport: None,
            clock_start: midday_today(),
        }
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.settings.batch_size = batch_size;
        self
    }

    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.settings.global_daily_limit = limit;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.settings.default_max_attempts = max_attempts;
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.settings.delay_between_messages_ms = delay_ms;
        self
    }

    /// Add an active sender with the given daily limit.
    pub fn with_sender(mut self, id: &str, address: &str, daily_limit: u32) -> Self {
        self.senders.push(SenderIdentity::new(id, address, daily_limit));
        self
    }

    /// Add `count` active senders named `sender-0..` with the same daily limit.
    pub fn with_senders(mut self, count: usize, daily_limit: u32) -> Self {
        for i in 0..count {
            self.senders.push(SenderIdentity::new(
                format!("sender-{i}"),
                format!("+1555100{i:04}"),
                daily_limit,
            ));
        }
        self
    }

    pub fn with_sender_identity(mut self, sender: SenderIdentity) -> Self {
        self.senders.push(sender);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_transport_timeout(mut self, timeout: Duration) -> Self {
        self.runner_config.transport_timeout = timeout;
        self
    }

    pub fn with_transport(mut self, transport: MockTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Start the harness clock at `start` instead of midday UTC today.
    pub fn with_clock_start(mut self, start: DateTime<Utc>) -> Self {
        self.clock_start = start;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, OutreachError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| OutreachError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = Arc::new(
            SqliteStorage::open(&db_path.to_string_lossy(), self.settings.clone()).await?,
        );
        for sender in &self.senders {
            storage.upsert_sender(sender).await?;
        }

        let transport = Arc::new(self.transport.unwrap_or_default());
        let clock = Arc::new(ManualClock::new(self.clock_start));
        let runner = Arc::new(
            DispatchRunner::new(storage.clone(), transport.clone())
                .with_policy(self.policy)
                .with_config(self.runner_config)
                .with_clock(clock.clone()),
        );

        Ok(TestHarness {
            storage,
            transport,
            clock,
            runner,
            settings: self.settings,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete dispatch environment backed by a temp database.
pub struct TestHarness {
    pub storage: Arc<SqliteStorage>,
    pub transport: Arc<MockTransport>,
    pub clock: Arc<ManualClock>,
    pub runner: Arc<DispatchRunner>,
    /// Settings seeded into the store.
    pub settings: DispatchSettings,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Enqueue a message due at the harness clock's current time
    /// (unless the message sets its own schedule).
    pub async fn enqueue(&self, msg: NewMessage) -> Result<QueueMessage, OutreachError> {
        let msg = match msg.scheduled_for {
            Some(_) => msg,
            None => msg.with_scheduled_for(self.clock.now()),
        };
        self.storage
            .enqueue(&msg, self.settings.default_max_attempts)
            .await
    }

    /// Fetch a message that the test knows exists.
    pub async fn message(&self, id: &str) -> Result<QueueMessage, OutreachError> {
        self.storage
            .get_message(id)
            .await?
            .ok_or_else(|| OutreachError::NotFound {
                entity: "message".to_string(),
                id: id.to_string(),
            })
    }

    pub async fn sender(&self, id: &str) -> Result<SenderIdentity, OutreachError> {
        self.storage
            .get_sender(id)
            .await?
            .ok_or_else(|| OutreachError::NotFound {
                entity: "sender".to_string(),
                id: id.to_string(),
            })
    }

    pub async fn run_batch(&self) -> Result<outreach_core::BatchSummary, OutreachError> {
        self.runner.run_batch().await
    }

    /// Move the harness clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

/// Midday keeps retry backoffs inside one UTC day.
fn midday_today() -> DateTime<Utc> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
    Utc::now().date_naive().and_time(noon).and_utc()
}
