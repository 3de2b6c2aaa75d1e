// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign summary persistence.

use async_trait::async_trait;

use crate::error::OutreachError;
use crate::types::{CampaignCounters, CampaignSummary};

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Recount the campaign's messages from the queue and overwrite the stored
    /// counters. Creates the summary record if it does not exist.
    async fn recompute_counters(&self, campaign_id: &str)
    -> Result<CampaignCounters, OutreachError>;

    async fn get_campaign(
        &self,
        campaign_id: &str,
    ) -> Result<Option<CampaignSummary>, OutreachError>;
}
