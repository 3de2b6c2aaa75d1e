// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The batch dispatch loop.
//!
//! A batch is strictly sequential: lease, pick a sender, send, record. Many
//! runners may share one database; the lease compare-and-set decides which
//! one owns a message. Inside one process, overlapping calls to
//! [`DispatchRunner::run_batch`] queue behind a mutex.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Days, NaiveTime, Utc};
use strum::Display;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use outreach_config::model::DispatchConfig;
use outreach_core::{
    BatchSummary, DispatchStore, FailureUpdate, OutreachError, QueueMessage, SenderIdentity,
    SentUpdate, TransportAdapter, TransportError, normalize_recipient,
};

use crate::aggregator::CampaignAggregator;
use crate::backoff::RetryPolicy;
use crate::clock::{Clock, SystemClock};
use crate::ledger::ConversationLedger;
use crate::pool::SenderPool;
use crate::telemetry;

/// Why a batch returned before sending anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EarlyExit {
    Disabled,
    DailyCapReached,
    NothingDue,
    NoSenders,
}

/// Timeouts that bound a single batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound on one transport call.
    pub transport_timeout: Duration,
    /// How long a lease protects a message before recovery may release it.
    pub lease_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

impl RunnerConfig {
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            transport_timeout: config.transport_timeout(),
            lease_timeout: config.lease_timeout(),
        }
    }
}

pub struct DispatchRunner {
    store: Arc<dyn DispatchStore>,
    transport: Arc<dyn TransportAdapter>,
    pool: SenderPool,
    ledger: ConversationLedger,
    aggregator: CampaignAggregator,
    policy: RetryPolicy,
    config: RunnerConfig,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    batch_guard: Mutex<()>,
}

impl DispatchRunner {
    pub fn new(store: Arc<dyn DispatchStore>, transport: Arc<dyn TransportAdapter>) -> Self {
        Self {
            pool: SenderPool::new(store.clone()),
            ledger: ConversationLedger::new(store.clone()),
            aggregator: CampaignAggregator::new(store.clone()),
            store,
            transport,
            policy: RetryPolicy::default(),
            config: RunnerConfig::default(),
            clock: Arc::new(SystemClock),
            cancel: CancellationToken::new(),
            batch_guard: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Cancelling this token stops the current batch after the in-flight send.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run one batch and report what happened.
    ///
    /// Only storage and configuration failures are returned as errors;
    /// per-message transport failures are recorded on the message.
    pub async fn run_batch(&self) -> Result<BatchSummary, OutreachError> {
        let _guard = self.batch_guard.lock().await;
        let started = Instant::now();

        let mut summary = match self.dispatch().await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "dispatch batch failed");
                return Err(e);
            }
        };

        summary.duration_ms = started.elapsed().as_millis() as u64;
        telemetry::record_batch_duration(started.elapsed().as_secs_f64());
        info!(
            processed = summary.processed,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            duration_ms = summary.duration_ms,
            "dispatch batch complete"
        );
        Ok(summary)
    }

    async fn dispatch(&self) -> Result<BatchSummary, OutreachError> {
        let mut summary = BatchSummary::default();
        let now = self.clock.now();

        let settings = self.store.load_settings().await?;
        if !settings.enabled {
            return Ok(early_exit(EarlyExit::Disabled, summary));
        }

        let (day_start, day_end) = utc_day_bounds(now);
        let sent_today = self.store.count_sent_between(day_start, day_end).await?;
        let daily_limit = u64::from(settings.global_daily_limit);
        if sent_today >= daily_limit {
            info!(sent_today, daily_limit, "global daily limit reached");
            return Ok(early_exit(EarlyExit::DailyCapReached, summary));
        }

        let mut rotation = self.pool.rotation().await?;
        telemetry::set_eligible_senders(rotation.len());
        if rotation.is_empty() {
            return Ok(early_exit(EarlyExit::NoSenders, summary));
        }

        // Only a batch that can actually send may touch message rows.
        let recovered = self.store.release_expired_leases(now).await?;
        if recovered > 0 {
            warn!(recovered, "released messages with expired leases");
        }

        let limit = u64::from(settings.batch_size).min(daily_limit - sent_today) as u32;
        let messages = self.store.select_eligible(now, limit).await?;
        if messages.is_empty() {
            return Ok(early_exit(EarlyExit::NothingDue, summary));
        }

        info!(
            candidates = messages.len(),
            senders = rotation.len(),
            sent_today,
            "dispatch batch started"
        );

        let pacing = settings.delay_between_messages();
        let mut touched_campaigns = BTreeSet::new();
        let mut has_sent = false;

        for msg in &messages {
            if self.cancel.is_cancelled() {
                info!("dispatch cancelled, stopping batch");
                break;
            }

            let lease_until = self.clock.now() + chrono_duration(self.config.lease_timeout);
            if !self.store.try_lease(&msg.id, lease_until).await? {
                debug!(message_id = %msg.id, "message leased by another runner, skipping");
                telemetry::record_lease_skipped();
                summary.skipped += 1;
                continue;
            }

            let Some(sender) = rotation.next_sender().cloned() else {
                self.store.release_lease(&msg.id).await?;
                info!(message_id = %msg.id, "sender quotas exhausted for this batch");
                break;
            };

            // Pacing sits between two transport calls, never after the last one.
            if has_sent && !pacing.is_zero() {
                let cancelled = tokio::select! {
                    _ = tokio::time::sleep(pacing) => false,
                    _ = self.cancel.cancelled() => true,
                };
                if cancelled {
                    self.store.release_lease(&msg.id).await?;
                    info!("dispatch cancelled during pacing, stopping batch");
                    break;
                }
            }

            summary.processed += 1;
            if let Some(campaign_id) = &msg.campaign_id {
                touched_campaigns.insert(campaign_id.clone());
            }

            match self.send(msg, &sender).await {
                Ok(external_id) => {
                    self.record_sent(msg, &sender, external_id).await?;
                    summary.sent += 1;
                }
                Err(err) => {
                    self.record_failed(msg, &sender, err).await?;
                    summary.failed += 1;
                }
            }
            has_sent = true;
        }

        self.aggregator
            .refresh(touched_campaigns.iter().map(String::as_str))
            .await;

        Ok(summary)
    }

    async fn send(&self, msg: &QueueMessage, sender: &SenderIdentity) -> Result<String, TransportError> {
        let to = normalize_recipient(&msg.recipient);
        debug!(
            message_id = %msg.id,
            from = %sender.address,
            to = %to,
            attempt = msg.attempts + 1,
            "sending message"
        );
        let timeout = self.config.transport_timeout;
        match tokio::time::timeout(timeout, self.transport.send(&sender.address, &to, &msg.body)).await {
            Ok(Ok(receipt)) => Ok(receipt.external_id),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(TransportError::timeout(timeout)),
        }
    }

    async fn record_sent(
        &self,
        msg: &QueueMessage,
        sender: &SenderIdentity,
        external_id: String,
    ) -> Result<(), OutreachError> {
        let sent_at = self.clock.now();
        let update = SentUpdate {
            attempts: msg.attempts + 1,
            sent_at,
            sender_address: sender.address.clone(),
            external_id: external_id.clone(),
        };
        if !self.store.mark_sent(&msg.id, &update).await? {
            warn!(message_id = %msg.id, "lease lost before the send was recorded");
        }
        telemetry::record_sent(&sender.address);

        // The provider already accepted the message; bookkeeping failures
        // from here on are logged and never undo the send.
        if let Err(e) = self.pool.record_usage(&sender.id, sent_at).await {
            warn!(sender_id = %sender.id, error = %e, "failed to record sender usage");
        }
        if let Err(e) = self
            .ledger
            .record_outbound(
                &normalize_recipient(&msg.recipient),
                &msg.body,
                Some(&external_id),
                msg.contact_ref.as_deref(),
                sent_at,
            )
            .await
        {
            warn!(message_id = %msg.id, error = %e, "failed to update conversation ledger");
        }

        debug!(message_id = %msg.id, external_id = %external_id, "message sent");
        Ok(())
    }

    async fn record_failed(
        &self,
        msg: &QueueMessage,
        sender: &SenderIdentity,
        err: TransportError,
    ) -> Result<(), OutreachError> {
        let attempts = msg.attempts + 1;
        let retry_at = (attempts < msg.max_attempts)
            .then(|| self.policy.next_attempt_at(self.clock.now(), attempts));
        let update = FailureUpdate {
            attempts,
            retry_at,
            error: err.to_string(),
        };
        if !self.store.record_failure(&msg.id, &update).await? {
            warn!(message_id = %msg.id, "lease lost before the failure was recorded");
        }
        telemetry::record_failed(&err.code);

        match retry_at {
            Some(retry_at) => warn!(
                message_id = %msg.id,
                sender = %sender.address,
                attempts,
                max_attempts = msg.max_attempts,
                code = %err.code,
                error = %err.message,
                retry_at = %retry_at,
                "send failed, retry scheduled"
            ),
            None => warn!(
                message_id = %msg.id,
                sender = %sender.address,
                attempts,
                code = %err.code,
                error = %err.message,
                "send failed, attempts exhausted"
            ),
        }
        Ok(())
    }
}

fn early_exit(reason: EarlyExit, summary: BatchSummary) -> BatchSummary {
    info!(reason = %reason, "dispatch batch exited early");
    summary
}

fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

/// `[00:00, next 00:00)` of the UTC day containing `now`.
pub(crate) fn utc_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let end = start.checked_add_days(Days::new(1)).unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_bounds_cover_the_utc_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap();
        let (start, end) = utc_day_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn early_exit_reasons_render_snake_case() {
        assert_eq!(EarlyExit::DailyCapReached.to_string(), "daily_cap_reached");
        assert_eq!(EarlyExit::NoSenders.to_string(), "no_senders");
    }

    #[test]
    fn runner_config_follows_dispatch_section() {
        let config = DispatchConfig {
            transport_timeout_secs: 3,
            lease_timeout_secs: 90,
            ..DispatchConfig::default()
        };
        let runner = RunnerConfig::from_config(&config);
        assert_eq!(runner.transport_timeout, Duration::from_secs(3));
        assert_eq!(runner.lease_timeout, Duration::from_secs(90));
    }
}
