// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender identity pool.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use outreach_core::{OutreachError, SenderIdentity};

use crate::database::{Database, map_tr_err};
use crate::models::{SENDER_COLUMNS, fmt_ts, sender_from_row};

/// Active senders with quota left, least used first.
pub async fn eligible_senders(db: &Database) -> Result<Vec<SenderIdentity>, OutreachError> {
    db.connection()
        .call(|conn| -> Result<Vec<SenderIdentity>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SENDER_COLUMNS} FROM senders \
                 WHERE status = 'active' AND sent_today < daily_limit \
                 ORDER BY sent_today ASC, last_used_at IS NOT NULL, last_used_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], sender_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Single-statement increment; never read-modify-write.
pub async fn record_usage(
    db: &Database,
    sender_id: &str,
    at: DateTime<Utc>,
) -> Result<(), OutreachError> {
    let id = sender_id.to_string();
    let at = fmt_ts(at);
    let changed = db
        .connection()
        .call({
            let id = id.clone();
            move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE senders SET sent_today = sent_today + 1, last_used_at = ?2 \
                     WHERE id = ?1",
                    params![id, at],
                )
            }
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(OutreachError::NotFound {
            entity: "sender".to_string(),
            id,
        });
    }
    Ok(())
}

pub async fn upsert_sender(db: &Database, sender: &SenderIdentity) -> Result<(), OutreachError> {
    let sender = sender.clone();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "INSERT INTO senders (id, address, status, sent_today, daily_limit, last_used_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(id) DO UPDATE SET address = excluded.address, \
                 status = excluded.status, sent_today = excluded.sent_today, \
                 daily_limit = excluded.daily_limit, last_used_at = excluded.last_used_at",
                params![
                    sender.id,
                    sender.address,
                    sender.status.to_string(),
                    sender.sent_today,
                    sender.daily_limit,
                    sender.last_used_at.map(fmt_ts),
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(())
}

pub async fn get_sender(
    db: &Database,
    sender_id: &str,
) -> Result<Option<SenderIdentity>, OutreachError> {
    let id = sender_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<SenderIdentity>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {SENDER_COLUMNS} FROM senders WHERE id = ?1"),
                params![id],
                sender_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
