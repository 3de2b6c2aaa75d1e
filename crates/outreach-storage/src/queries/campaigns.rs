// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign summary counters, recomputed from the queue.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use outreach_core::{CampaignCounters, CampaignSummary, MessageStatus, OutreachError};

use crate::database::{Database, map_tr_err};
use crate::models::{campaign_from_row, fmt_ts};

/// Recount the campaign's messages by status and overwrite its summary row.
///
/// `processing` rows are still in flight and count as pending.
pub async fn recompute_counters(
    db: &Database,
    campaign_id: &str,
) -> Result<CampaignCounters, OutreachError> {
    let campaign_id = campaign_id.to_string();
    let now = fmt_ts(Utc::now());
    db.connection()
        .call(move |conn| -> Result<CampaignCounters, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut counters = CampaignCounters::default();
            {
                let mut stmt = tx.prepare(
                    "SELECT status, COUNT(*) FROM queue_messages \
                     WHERE campaign_id = ?1 GROUP BY status",
                )?;
                let rows = stmt.query_map(params![campaign_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                for row in rows {
                    let (status, count) = row?;
                    let count = count.max(0) as u64;
                    match status.parse::<MessageStatus>() {
                        Ok(MessageStatus::Sent) => counters.sent += count,
                        Ok(MessageStatus::Failed) => counters.failed += count,
                        Ok(MessageStatus::Pending | MessageStatus::Processing) => {
                            counters.pending += count
                        }
                        Err(_) => {}
                    }
                }
            }
            tx.execute(
                "INSERT INTO campaigns (id, sent_count, pending_count, failed_count, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(id) DO UPDATE SET sent_count = excluded.sent_count, \
                 pending_count = excluded.pending_count, failed_count = excluded.failed_count, \
                 updated_at = excluded.updated_at",
                params![
                    campaign_id,
                    counters.sent as i64,
                    counters.pending as i64,
                    counters.failed as i64,
                    now
                ],
            )?;
            tx.commit()?;
            Ok(counters)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_campaign(
    db: &Database,
    campaign_id: &str,
) -> Result<Option<CampaignSummary>, OutreachError> {
    let campaign_id = campaign_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<CampaignSummary>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, name, sent_count, pending_count, failed_count, updated_at \
                 FROM campaigns WHERE id = ?1",
                params![campaign_id],
                campaign_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
