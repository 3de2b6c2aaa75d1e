// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Outreach dispatch queue.
//!
//! Only errors that abort a whole batch live here. Per-message transport
//! failures are plain data ([`TransportError`](crate::types::TransportError))
//! and are absorbed into queue state.

use thiserror::Error;

/// The primary error type used across all Outreach traits and core operations.
#[derive(Debug, Error)]
pub enum OutreachError {
    /// Configuration errors (invalid TOML, missing credentials, missing settings record).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport setup errors (client construction, unusable credentials).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Caller supplied invalid input (empty recipient or body).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OutreachError {
    /// Whether this error should abort the current batch and be surfaced to the scheduler.
    ///
    /// Input and lookup errors belong to a single request; everything else
    /// means the dispatcher cannot safely continue.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            OutreachError::InvalidInput(_) | OutreachError::NotFound { .. }
        )
    }
}
