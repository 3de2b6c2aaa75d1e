// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Outreach dispatch queue.
//!
//! This crate provides the domain types (queue messages, sender identities,
//! conversation threads, campaign counters), the error type, and the
//! repository and transport traits that the storage, dispatch, and transport
//! crates implement or consume.

pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::OutreachError;
pub use phone::normalize_recipient;
pub use types::{
    AdapterType, BatchSummary, CampaignCounters, CampaignSummary, ConversationThread,
    Direction, DispatchSettings, FailureUpdate, HealthStatus, LogStatus, MessageLogEntry,
    MessageStatus, NewLogEntry, NewMessage, QueueMessage, SendReceipt, SenderIdentity,
    SenderStatus, SentUpdate, ThreadUpsert, TransportError,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    CampaignStore, ConversationStore, DispatchStore, PluginAdapter, QueueStore, SenderStore,
    SettingsStore, StorageAdapter, TransportAdapter,
};
