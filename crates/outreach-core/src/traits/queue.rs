// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable message queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::OutreachError;
use crate::types::{FailureUpdate, NewMessage, QueueMessage, SentUpdate};

/// Persistence of outbound messages and their lifecycle transitions.
///
/// Every mutation after a lease is guarded by `status = processing`, so a
/// runner that lost its lease cannot overwrite another runner's outcome.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Insert a new pending message. `default_max_attempts` applies when the
    /// request does not carry its own.
    async fn enqueue(
        &self,
        msg: &NewMessage,
        default_max_attempts: u32,
    ) -> Result<QueueMessage, OutreachError>;

    async fn get_message(&self, id: &str) -> Result<Option<QueueMessage>, OutreachError>;

    /// Count messages whose `sent_at` falls in `[start, end)`.
    async fn count_sent_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, OutreachError>;

    /// Pending messages due at `now`, highest priority first, then oldest
    /// `scheduled_for`, then oldest `created_at`.
    async fn select_eligible(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<QueueMessage>, OutreachError>;

    /// Atomically move one message from `pending` to `processing`.
    ///
    /// Returns `false` when another runner claimed it first.
    async fn try_lease(&self, id: &str, until: DateTime<Utc>) -> Result<bool, OutreachError>;

    /// Return a leased message to `pending` without consuming an attempt.
    async fn release_lease(&self, id: &str) -> Result<(), OutreachError>;

    /// Return every message whose lease expired before `now` to `pending`.
    async fn release_expired_leases(&self, now: DateTime<Utc>) -> Result<u64, OutreachError>;

    /// Record a successful send. Returns `false` if the lease was lost.
    async fn mark_sent(&self, id: &str, update: &SentUpdate) -> Result<bool, OutreachError>;

    /// Record a failed send, rescheduling or terminally failing the message.
    /// Returns `false` if the lease was lost.
    async fn record_failure(
        &self,
        id: &str,
        update: &FailureUpdate,
    ) -> Result<bool, OutreachError>;
}
