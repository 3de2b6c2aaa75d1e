// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the storage, dispatch, and gateway crates.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Transport,
    Observability,
}

// --- Queue ---

/// Lifecycle state of a queued message.
///
/// Valid transitions: `Pending -> Processing -> {Sent | Pending | Failed}`.
/// `Sent` and `Failed` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl MessageStatus {
    /// Terminal states are never left once entered.
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Sent | MessageStatus::Failed)
    }
}

/// A unit of outbound work stored in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub id: String,
    /// Normalized destination address.
    pub recipient: String,
    /// Destination address exactly as the caller supplied it.
    pub original_recipient: String,
    pub body: String,
    pub campaign_id: Option<String>,
    pub contact_ref: Option<String>,
    /// Higher values are sent first.
    pub priority: i64,
    /// Not eligible for dispatch before this instant.
    pub scheduled_for: DateTime<Utc>,
    pub status: MessageStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    /// Address of the sender identity that delivered the message.
    pub assigned_sender: Option<String>,
    pub external_message_id: Option<String>,
    /// Lease expiry while the message is `Processing`.
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enqueue request accepted from callers (campaign tooling, the HTTP gateway).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub recipient: String,
    pub body: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub contact_ref: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Overrides the settings default when present.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl NewMessage {
    pub fn new(recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_campaign(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaign_id = Some(campaign_id.into());
        self
    }

    pub fn with_contact_ref(mut self, contact_ref: impl Into<String>) -> Self {
        self.contact_ref = Some(contact_ref.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_for = Some(at);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Reject requests that cannot possibly be delivered.
    ///
    /// Message content is not inspected beyond emptiness.
    pub fn validate(&self) -> Result<(), crate::OutreachError> {
        if self.recipient.trim().is_empty() {
            return Err(crate::OutreachError::InvalidInput(
                "recipient must not be empty".to_string(),
            ));
        }
        if self.body.trim().is_empty() {
            return Err(crate::OutreachError::InvalidInput(
                "body must not be empty".to_string(),
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(crate::OutreachError::InvalidInput(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fields written when a send succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct SentUpdate {
    pub attempts: u32,
    pub sent_at: DateTime<Utc>,
    pub sender_address: String,
    pub external_id: String,
}

/// Fields written when a send fails.
///
/// `retry_at = Some(..)` returns the message to `Pending`; `None` marks it
/// permanently `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureUpdate {
    pub attempts: u32,
    pub retry_at: Option<DateTime<Utc>>,
    pub error: String,
}

// --- Senders ---

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderStatus {
    Active,
    Suspended,
}

/// A sending capability with its own daily quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderIdentity {
    pub id: String,
    /// Outbound address (phone number) used as the `from` of a send.
    pub address: String,
    pub status: SenderStatus,
    pub sent_today: u32,
    pub daily_limit: u32,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl SenderIdentity {
    pub fn new(id: impl Into<String>, address: impl Into<String>, daily_limit: u32) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            status: SenderStatus::Active,
            sent_today: 0,
            daily_limit,
            last_used_at: None,
        }
    }

    /// Sends still available today.
    pub fn remaining_quota(&self) -> u32 {
        self.daily_limit.saturating_sub(self.sent_today)
    }

    pub fn is_eligible(&self) -> bool {
        self.status == SenderStatus::Active && self.sent_today < self.daily_limit
    }
}

// --- Settings ---

/// Process-wide dispatch settings, stored as a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSettings {
    pub enabled: bool,
    /// Maximum number of messages pulled per batch.
    pub batch_size: u32,
    /// Pause between consecutive sends within a batch.
    pub delay_between_messages_ms: u64,
    /// Maximum number of messages sent per UTC day across all senders.
    pub global_daily_limit: u32,
    /// Applied at enqueue time when the caller does not choose one.
    pub default_max_attempts: u32,
}

impl DispatchSettings {
    pub fn delay_between_messages(&self) -> Duration {
        Duration::from_millis(self.delay_between_messages_ms)
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 50,
            delay_between_messages_ms: 1000,
            global_daily_limit: 1000,
            default_max_attempts: 3,
        }
    }
}

// --- Conversation ledger ---

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Per-recipient conversation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    pub id: String,
    pub address: String,
    pub contact_ref: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub last_message_preview: String,
    pub last_message_direction: Direction,
    pub total_messages: u64,
    pub unread_count: u64,
}

/// Find-or-create request for a conversation thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadUpsert {
    pub address: String,
    pub preview: String,
    pub direction: Direction,
    pub contact_ref: Option<String>,
    pub at: DateTime<Utc>,
}

/// Delivery state recorded on a message log entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Sent,
    Received,
}

/// Append-only record of one transmitted or received message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: String,
    pub thread_id: String,
    pub direction: Direction,
    pub body: String,
    pub external_id: Option<String>,
    pub status: LogStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub thread_id: String,
    pub direction: Direction,
    pub body: String,
    pub external_id: Option<String>,
    pub status: LogStatus,
    pub at: DateTime<Utc>,
}

// --- Campaigns ---

/// Freshly recomputed message counts for one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CampaignCounters {
    pub sent: u64,
    pub pending: u64,
    pub failed: u64,
}

/// Campaign summary record as stored for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: String,
    pub name: Option<String>,
    pub counters: CampaignCounters,
    pub updated_at: DateTime<Utc>,
}

// --- Transport ---

/// Successful hand-off to the transport provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Provider-assigned message identifier.
    pub external_id: String,
}

/// Typed failure of a single send.
///
/// This is data, not an [`OutreachError`](crate::OutreachError): a failed send
/// never aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportError {
    /// Short machine-readable code (`timeout`, `network`, `client_error`, ...).
    pub code: String,
    pub message: String,
    /// Provider hint. The retry policy is uniform, so this is informational.
    pub retryable: bool,
}

impl TransportError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            "timeout",
            format!("transport call timed out after {}ms", after.as_millis()),
            true,
        )
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

// --- Batch ---

/// Outcome counts of one dispatch batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Messages leased by this run (sent + failed).
    pub processed: u32,
    pub sent: u32,
    /// Failed sends, including those rescheduled for retry.
    pub failed: u32,
    /// Messages already claimed by another runner.
    pub skipped: u32,
    pub duration_ms: u64,
}
