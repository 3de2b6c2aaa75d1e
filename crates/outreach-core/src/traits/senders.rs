// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender identity pool persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::OutreachError;
use crate::types::SenderIdentity;

#[async_trait]
pub trait SenderStore: Send + Sync {
    /// Active senders below their daily limit, least used today first.
    /// Ties go to the sender used longest ago (never-used first).
    async fn eligible_senders(&self) -> Result<Vec<SenderIdentity>, OutreachError>;

    /// Atomically increment `sent_today` and stamp `last_used_at`.
    async fn record_usage(&self, sender_id: &str, at: DateTime<Utc>)
    -> Result<(), OutreachError>;

    /// Create or replace a sender identity by id.
    async fn upsert_sender(&self, sender: &SenderIdentity) -> Result<(), OutreachError>;

    async fn get_sender(&self, sender_id: &str) -> Result<Option<SenderIdentity>, OutreachError>;
}
