// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The singleton `dispatch_settings` record (id = 1).

use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use outreach_core::{DispatchSettings, OutreachError};

use crate::database::{Database, map_tr_err};
use crate::models::fmt_ts;

const SETTINGS_ID: i64 = 1;

fn delay_to_sql(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

/// Load the settings record, or `None` if it was never written.
pub async fn load_settings(db: &Database) -> Result<Option<DispatchSettings>, OutreachError> {
    db.connection()
        .call(|conn| -> Result<Option<DispatchSettings>, rusqlite::Error> {
            conn.query_row(
                "SELECT enabled, batch_size, delay_between_messages_ms, global_daily_limit, \
                 default_max_attempts FROM dispatch_settings WHERE id = ?1",
                params![SETTINGS_ID],
                |row| {
                    let delay: i64 = row.get(2)?;
                    Ok(DispatchSettings {
                        enabled: row.get(0)?,
                        batch_size: row.get(1)?,
                        delay_between_messages_ms: delay.max(0) as u64,
                        global_daily_limit: row.get(3)?,
                        default_max_attempts: row.get(4)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the settings record.
pub async fn save_settings(db: &Database, settings: &DispatchSettings) -> Result<(), OutreachError> {
    write(db, settings, "INSERT OR REPLACE").await.map(|_| ())
}

/// Write the record only if none exists yet. Returns `true` if it was written.
pub async fn seed_settings(db: &Database, settings: &DispatchSettings) -> Result<bool, OutreachError> {
    Ok(write(db, settings, "INSERT OR IGNORE").await? == 1)
}

async fn write(
    db: &Database,
    settings: &DispatchSettings,
    verb: &'static str,
) -> Result<usize, OutreachError> {
    if settings.batch_size < 1 || settings.default_max_attempts < 1 {
        return Err(OutreachError::InvalidInput(
            "batch_size and default_max_attempts must be at least 1".to_string(),
        ));
    }
    let s = settings.clone();
    let now = fmt_ts(Utc::now());
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                &format!(
                    "{verb} INTO dispatch_settings (id, enabled, batch_size, \
                     delay_between_messages_ms, global_daily_limit, default_max_attempts, \
                     updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    SETTINGS_ID,
                    s.enabled,
                    s.batch_size,
                    delay_to_sql(s.delay_between_messages_ms),
                    s.global_daily_limit,
                    s.default_max_attempts,
                    now,
                ],
            )
        })
        .await
        .map_err(map_tr_err)
}
