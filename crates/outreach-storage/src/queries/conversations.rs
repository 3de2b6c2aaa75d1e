// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation threads and the append-only message log.

use rusqlite::{OptionalExtension, params};

use outreach_core::{
    ConversationThread, Direction, MessageLogEntry, NewLogEntry, OutreachError, ThreadUpsert,
};

use crate::database::{Database, map_tr_err};
use crate::models::{LOG_COLUMNS, THREAD_COLUMNS, fmt_ts, log_entry_from_row, thread_from_row};

/// Maximum characters kept in `last_message_preview`.
pub const PREVIEW_CHARS: usize = 160;

pub fn truncate_preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Atomic find-or-create on the UNIQUE address column.
///
/// Each call counts one message on the thread. Inbound messages also bump
/// `unread_count`; outbound ones leave it alone.
pub async fn upsert_thread(db: &Database, upsert: &ThreadUpsert) -> Result<String, OutreachError> {
    let new_id = uuid::Uuid::new_v4().to_string();
    let address = upsert.address.clone();
    let contact_ref = upsert.contact_ref.clone();
    let at = fmt_ts(upsert.at);
    let preview = truncate_preview(&upsert.preview);
    let direction = upsert.direction.to_string();
    let unread: i64 = match upsert.direction {
        Direction::Inbound => 1,
        Direction::Outbound => 0,
    };

    db.connection()
        .call(move |conn| -> Result<String, rusqlite::Error> {
            conn.query_row(
                "INSERT INTO conversation_threads (id, address, contact_ref, last_message_at, \
                 last_message_preview, last_message_direction, total_messages, unread_count, \
                 created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?4) \
                 ON CONFLICT(address) DO UPDATE SET \
                 contact_ref = COALESCE(excluded.contact_ref, conversation_threads.contact_ref), \
                 last_message_at = excluded.last_message_at, \
                 last_message_preview = excluded.last_message_preview, \
                 last_message_direction = excluded.last_message_direction, \
                 total_messages = conversation_threads.total_messages + 1, \
                 unread_count = conversation_threads.unread_count + excluded.unread_count \
                 RETURNING id",
                params![new_id, address, contact_ref, at, preview, direction, unread],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Insert an immutable log entry and return its id.
pub async fn append_log_entry(db: &Database, entry: &NewLogEntry) -> Result<String, OutreachError> {
    let id = uuid::Uuid::new_v4().to_string();
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<String, rusqlite::Error> {
            conn.execute(
                "INSERT INTO message_log (id, thread_id, direction, body, external_id, status, \
                 created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    entry.thread_id,
                    entry.direction.to_string(),
                    entry.body,
                    entry.external_id,
                    entry.status.to_string(),
                    fmt_ts(entry.at),
                ],
            )?;
            Ok(id)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_thread_by_address(
    db: &Database,
    address: &str,
) -> Result<Option<ConversationThread>, OutreachError> {
    let address = address.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ConversationThread>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {THREAD_COLUMNS} FROM conversation_threads WHERE address = ?1"),
                params![address],
                thread_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_log_entries(
    db: &Database,
    thread_id: &str,
) -> Result<Vec<MessageLogEntry>, OutreachError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<MessageLogEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LOG_COLUMNS} FROM message_log WHERE thread_id = ?1 \
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map(params![thread_id], log_entry_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
