// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation thread and message log persistence.

use async_trait::async_trait;

use crate::error::OutreachError;
use crate::types::{ConversationThread, MessageLogEntry, NewLogEntry, ThreadUpsert};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Find or create the thread for `upsert.address` and refresh its summary.
    ///
    /// At most one thread exists per address, even under concurrent calls.
    /// Returns the thread id.
    async fn upsert_thread(&self, upsert: &ThreadUpsert) -> Result<String, OutreachError>;

    /// Append an immutable log entry. Returns the new entry id.
    async fn append_log_entry(&self, entry: &NewLogEntry) -> Result<String, OutreachError>;

    async fn get_thread_by_address(
        &self,
        address: &str,
    ) -> Result<Option<ConversationThread>, OutreachError>;

    /// Log entries of a thread, oldest first.
    async fn list_log_entries(
        &self,
        thread_id: &str,
    ) -> Result<Vec<MessageLogEntry>, OutreachError>;
}
