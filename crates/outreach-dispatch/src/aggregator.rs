// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign counter refresh after a batch.

use std::sync::Arc;

use tracing::{debug, warn};

use outreach_core::DispatchStore;

pub struct CampaignAggregator {
    store: Arc<dyn DispatchStore>,
}

impl CampaignAggregator {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    /// Recompute counters for each campaign. Returns how many were refreshed.
    ///
    /// Failures are logged and skipped; the next refresh recounts from scratch.
    pub async fn refresh<'a>(&self, campaign_ids: impl IntoIterator<Item = &'a str>) -> usize {
        let mut refreshed = 0;
        for campaign_id in campaign_ids {
            match self.store.recompute_counters(campaign_id).await {
                Ok(counters) => {
                    debug!(
                        campaign_id,
                        sent = counters.sent,
                        pending = counters.pending,
                        failed = counters.failed,
                        "campaign counters recomputed"
                    );
                    refreshed += 1;
                }
                Err(e) => warn!(campaign_id, error = %e, "failed to recompute campaign counters"),
            }
        }
        refreshed
    }
}
