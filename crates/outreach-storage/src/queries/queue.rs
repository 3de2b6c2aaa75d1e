// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message queue: enqueue, eligibility, leasing, and outcomes.
//!
//! Every post-lease write is conditional on `status = 'processing'`; the
//! affected-row count tells the caller whether it still owned the message.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use outreach_core::{
    FailureUpdate, MessageStatus, NewMessage, OutreachError, QueueMessage, SentUpdate,
    normalize_recipient,
};

use crate::database::{Database, map_tr_err};
use crate::models::{QUEUE_COLUMNS, fmt_ts, queue_message_from_row};

/// Insert a new pending message and return the stored row.
pub async fn enqueue(
    db: &Database,
    msg: &NewMessage,
    default_max_attempts: u32,
) -> Result<QueueMessage, OutreachError> {
    msg.validate()?;
    let max_attempts = msg.max_attempts.unwrap_or(default_max_attempts);
    if max_attempts < 1 {
        return Err(OutreachError::InvalidInput(
            "max_attempts must be at least 1".to_string(),
        ));
    }

    let now = Utc::now();
    let id = uuid::Uuid::new_v4().to_string();
    let recipient = normalize_recipient(&msg.recipient);
    let original_recipient = msg.recipient.clone();
    let body = msg.body.clone();
    let campaign_id = msg.campaign_id.clone();
    let contact_ref = msg.contact_ref.clone();
    let priority = msg.priority.unwrap_or(0);
    let scheduled_for = fmt_ts(msg.scheduled_for.unwrap_or(now));
    let created_at = fmt_ts(now);

    db.connection()
        .call(move |conn| -> Result<QueueMessage, rusqlite::Error> {
            conn.execute(
                "INSERT INTO queue_messages (id, recipient, original_recipient, body, \
                 campaign_id, contact_ref, priority, scheduled_for, status, attempts, \
                 max_attempts, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', 0, ?9, ?10, ?10)",
                params![
                    id,
                    recipient,
                    original_recipient,
                    body,
                    campaign_id,
                    contact_ref,
                    priority,
                    scheduled_for,
                    max_attempts,
                    created_at,
                ],
            )?;
            conn.query_row(
                &format!("SELECT {QUEUE_COLUMNS} FROM queue_messages WHERE id = ?1"),
                params![id],
                queue_message_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_message(db: &Database, id: &str) -> Result<Option<QueueMessage>, OutreachError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<QueueMessage>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {QUEUE_COLUMNS} FROM queue_messages WHERE id = ?1"),
                params![id],
                queue_message_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of `sent` messages whose `sent_at` falls in `[start, end)`.
pub async fn count_sent_between(
    db: &Database,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<u64, OutreachError> {
    let start = fmt_ts(start);
    let end = fmt_ts(end);
    let count = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM queue_messages \
                 WHERE status = 'sent' AND sent_at >= ?1 AND sent_at < ?2",
                params![start, end],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(count.max(0) as u64)
}

/// Pending messages due at `now` in dispatch order.
pub async fn select_eligible(
    db: &Database,
    now: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<QueueMessage>, OutreachError> {
    let now = fmt_ts(now);
    db.connection()
        .call(move |conn| -> Result<Vec<QueueMessage>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {QUEUE_COLUMNS} FROM queue_messages \
                 WHERE status = 'pending' AND scheduled_for <= ?1 \
                 ORDER BY priority DESC, scheduled_for ASC, created_at ASC, id ASC \
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![now, limit], queue_message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Compare-and-set `pending -> processing`. `false` means another runner won.
pub async fn try_lease(
    db: &Database,
    id: &str,
    until: DateTime<Utc>,
) -> Result<bool, OutreachError> {
    let id = id.to_string();
    let until = fmt_ts(until);
    let now = fmt_ts(Utc::now());
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE queue_messages SET status = 'processing', locked_until = ?2, \
                 updated_at = ?3 WHERE id = ?1 AND status = 'pending'",
                params![id, until, now],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed == 1)
}

/// Give a leased message back without consuming an attempt.
pub async fn release_lease(db: &Database, id: &str) -> Result<(), OutreachError> {
    let id = id.to_string();
    let now = fmt_ts(Utc::now());
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE queue_messages SET status = 'pending', locked_until = NULL, \
                 updated_at = ?2 WHERE id = ?1 AND status = 'processing'",
                params![id, now],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(())
}

/// Return messages stuck in `processing` past their lease to `pending`.
pub async fn release_expired_leases(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<u64, OutreachError> {
    let now = fmt_ts(now);
    let released = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE queue_messages SET status = 'pending', locked_until = NULL, \
                 updated_at = ?1 \
                 WHERE status = 'processing' AND (locked_until IS NULL OR locked_until < ?1)",
                params![now],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(released as u64)
}

pub async fn mark_sent(db: &Database, id: &str, update: &SentUpdate) -> Result<bool, OutreachError> {
    let id = id.to_string();
    let attempts = update.attempts;
    let sent_at = fmt_ts(update.sent_at);
    let sender = update.sender_address.clone();
    let external_id = update.external_id.clone();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE queue_messages SET status = 'sent', attempts = ?2, sent_at = ?3, \
                 assigned_sender = ?4, external_message_id = ?5, last_error = NULL, \
                 locked_until = NULL, updated_at = ?3 \
                 WHERE id = ?1 AND status = 'processing'",
                params![id, attempts, sent_at, sender, external_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed == 1)
}

/// Record a failed attempt: back to `pending` at `retry_at`, or terminally `failed`.
pub async fn record_failure(
    db: &Database,
    id: &str,
    update: &FailureUpdate,
) -> Result<bool, OutreachError> {
    let id = id.to_string();
    let attempts = update.attempts;
    let error = update.error.clone();
    let retry_at = update.retry_at.map(fmt_ts);
    let now = fmt_ts(Utc::now());
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            match retry_at {
                Some(retry_at) => conn.execute(
                    "UPDATE queue_messages SET status = ?2, attempts = ?3, \
                     scheduled_for = ?4, last_error = ?5, locked_until = NULL, updated_at = ?6 \
                     WHERE id = ?1 AND status = 'processing'",
                    params![
                        id,
                        MessageStatus::Pending.to_string(),
                        attempts,
                        retry_at,
                        error,
                        now
                    ],
                ),
                None => conn.execute(
                    "UPDATE queue_messages SET status = ?2, attempts = ?3, \
                     last_error = ?4, locked_until = NULL, updated_at = ?5 \
                     WHERE id = ?1 AND status = 'processing'",
                    params![id, MessageStatus::Failed.to_string(), attempts, error, now],
                ),
            }
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed == 1)
}
