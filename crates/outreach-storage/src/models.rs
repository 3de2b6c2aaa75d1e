// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row decoding helpers shared by the query modules.
//!
//! Timestamps are stored as UTC text with millisecond precision
//! (`%Y-%m-%dT%H:%M:%S%.3fZ`), the same shape SQLite's
//! `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` produces, so text order is time order.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

use outreach_core::{
    CampaignCounters, CampaignSummary, ConversationThread, Direction, MessageLogEntry,
    QueueMessage, SenderIdentity,
};

/// Format a timestamp for storage.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp.
pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        parse_ts(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Decode a strum-backed enum stored as text.
pub(crate) fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a non-negative counter column.
pub(crate) fn get_count(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

pub(crate) const QUEUE_COLUMNS: &str = "id, recipient, original_recipient, body, campaign_id, \
     contact_ref, priority, scheduled_for, status, attempts, max_attempts, last_error, \
     sent_at, assigned_sender, external_message_id, locked_until, created_at, updated_at";

pub(crate) fn queue_message_from_row(row: &Row<'_>) -> rusqlite::Result<QueueMessage> {
    Ok(QueueMessage {
        id: row.get(0)?,
        recipient: row.get(1)?,
        original_recipient: row.get(2)?,
        body: row.get(3)?,
        campaign_id: row.get(4)?,
        contact_ref: row.get(5)?,
        priority: row.get(6)?,
        scheduled_for: get_ts(row, 7)?,
        status: get_enum(row, 8)?,
        attempts: row.get(9)?,
        max_attempts: row.get(10)?,
        last_error: row.get(11)?,
        sent_at: get_opt_ts(row, 12)?,
        assigned_sender: row.get(13)?,
        external_message_id: row.get(14)?,
        locked_until: get_opt_ts(row, 15)?,
        created_at: get_ts(row, 16)?,
        updated_at: get_ts(row, 17)?,
    })
}

pub(crate) const SENDER_COLUMNS: &str =
    "id, address, status, sent_today, daily_limit, last_used_at";

pub(crate) fn sender_from_row(row: &Row<'_>) -> rusqlite::Result<SenderIdentity> {
    Ok(SenderIdentity {
        id: row.get(0)?,
        address: row.get(1)?,
        status: get_enum(row, 2)?,
        sent_today: row.get(3)?,
        daily_limit: row.get(4)?,
        last_used_at: get_opt_ts(row, 5)?,
    })
}

pub(crate) const THREAD_COLUMNS: &str = "id, address, contact_ref, last_message_at, \
     last_message_preview, last_message_direction, total_messages, unread_count";

pub(crate) fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationThread> {
    Ok(ConversationThread {
        id: row.get(0)?,
        address: row.get(1)?,
        contact_ref: row.get(2)?,
        last_message_at: get_ts(row, 3)?,
        last_message_preview: row.get(4)?,
        last_message_direction: get_enum::<Direction>(row, 5)?,
        total_messages: get_count(row, 6)?,
        unread_count: get_count(row, 7)?,
    })
}

pub(crate) const LOG_COLUMNS: &str =
    "id, thread_id, direction, body, external_id, status, created_at";

pub(crate) fn log_entry_from_row(row: &Row<'_>) -> rusqlite::Result<MessageLogEntry> {
    Ok(MessageLogEntry {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        direction: get_enum(row, 2)?,
        body: row.get(3)?,
        external_id: row.get(4)?,
        status: get_enum(row, 5)?,
        created_at: get_ts(row, 6)?,
    })
}

pub(crate) fn campaign_from_row(row: &Row<'_>) -> rusqlite::Result<CampaignSummary> {
    Ok(CampaignSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        counters: CampaignCounters {
            sent: get_count(row, 2)?,
            pending: get_count(row, 3)?,
            failed: get_count(row, 4)?,
        },
        updated_at: get_ts(row, 5)?,
    })
}
