// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation ledger: one thread per recipient plus an append-only log.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use outreach_core::{
    Direction, DispatchStore, LogStatus, NewLogEntry, OutreachError, ThreadUpsert,
};

pub struct ConversationLedger {
    store: Arc<dyn DispatchStore>,
}

impl ConversationLedger {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    /// Record a delivered outbound message. Returns the thread id.
    pub async fn record_outbound(
        &self,
        address: &str,
        body: &str,
        external_id: Option<&str>,
        contact_ref: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<String, OutreachError> {
        self.record(Direction::Outbound, LogStatus::Sent, address, body, external_id, contact_ref, at)
            .await
    }

    /// Record a reply received from `address`. Returns the thread id.
    pub async fn record_inbound(
        &self,
        address: &str,
        body: &str,
        external_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<String, OutreachError> {
        self.record(Direction::Inbound, LogStatus::Received, address, body, external_id, None, at)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        direction: Direction,
        status: LogStatus,
        address: &str,
        body: &str,
        external_id: Option<&str>,
        contact_ref: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<String, OutreachError> {
        let thread_id = self
            .store
            .upsert_thread(&ThreadUpsert {
                address: address.to_string(),
                preview: body.to_string(),
                direction,
                contact_ref: contact_ref.map(str::to_string),
                at,
            })
            .await?;
        self.store
            .append_log_entry(&NewLogEntry {
                thread_id: thread_id.clone(),
                direction,
                body: body.to_string(),
                external_id: external_id.map(str::to_string),
                status,
                at,
            })
            .await?;
        Ok(thread_id)
    }
}
