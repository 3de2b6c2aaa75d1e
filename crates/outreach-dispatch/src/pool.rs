// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender pool: which identities may send, and usage accounting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use outreach_core::{DispatchStore, OutreachError};

use crate::rotation::SenderRotation;

pub struct SenderPool {
    store: Arc<dyn DispatchStore>,
}

impl SenderPool {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    /// Rotation over the senders currently active and under quota.
    pub async fn rotation(&self) -> Result<SenderRotation, OutreachError> {
        let senders = self.store.eligible_senders().await?;
        debug!(count = senders.len(), "eligible senders loaded");
        Ok(SenderRotation::new(senders))
    }

    /// Count one successful send against the sender's daily quota.
    pub async fn record_usage(&self, sender_id: &str, at: DateTime<Utc>) -> Result<(), OutreachError> {
        self.store.record_usage(sender_id, at).await
    }
}
