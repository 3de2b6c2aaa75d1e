// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the dispatch runner.
//!
//! Each test builds an isolated TestHarness with a temp SQLite store, a mock
//! transport, and a manual clock. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;

use outreach_core::{
    AdapterType, CampaignStore, ConversationStore, DispatchSettings, Direction, HealthStatus,
    MessageStatus, NewMessage, OutreachError, PluginAdapter, QueueStore, SendReceipt,
    TransportAdapter, TransportError,
};
use outreach_dispatch::{Clock, DispatchRunner, RetryPolicy};
use outreach_storage::SqliteStorage;
use outreach_test_utils::{MockOutcome, MockTransport, TestHarness};

fn msg(n: usize) -> NewMessage {
    NewMessage::new(format!("+1555200{n:04}"), format!("hello #{n}"))
}

// ---- Ordering and batch limits ----

#[tokio::test]
async fn higher_priority_messages_go_first() {
    let h = TestHarness::builder()
        .with_batch_size(2)
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();

    let low = h.enqueue(msg(1).with_priority(1)).await.unwrap();
    let high = h.enqueue(msg(2).with_priority(5)).await.unwrap();
    let mid = h.enqueue(msg(3).with_priority(3)).await.unwrap();

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.sent, 2);

    let calls = h.transport.calls().await;
    assert_eq!(calls[0].body, "hello #2");
    assert_eq!(calls[1].body, "hello #3");

    assert_eq!(h.message(&high.id).await.unwrap().status, MessageStatus::Sent);
    assert_eq!(h.message(&mid.id).await.unwrap().status, MessageStatus::Sent);
    assert_eq!(h.message(&low.id).await.unwrap().status, MessageStatus::Pending);
}

#[tokio::test]
async fn future_messages_wait_for_their_schedule() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();

    let later = h.clock.now() + ChronoDuration::minutes(10);
    let queued = h.enqueue(msg(1).with_scheduled_for(later)).await.unwrap();

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 0);

    h.advance(Duration::from_secs(600));
    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(h.message(&queued.id).await.unwrap().status, MessageStatus::Sent);
}

#[tokio::test]
async fn successful_send_records_sender_and_external_id() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();

    let queued = h
        .enqueue(NewMessage::new("(555) 123-4567", "welcome"))
        .await
        .unwrap();
    h.run_batch().await.unwrap();

    let sent = h.message(&queued.id).await.unwrap();
    assert_eq!(sent.status, MessageStatus::Sent);
    assert_eq!(sent.attempts, 1);
    assert_eq!(sent.assigned_sender.as_deref(), Some("+15550000001"));
    assert!(sent.external_message_id.is_some());
    assert_eq!(sent.sent_at, Some(h.clock.now()));
    assert!(sent.locked_until.is_none());

    let calls = h.transport.calls().await;
    assert_eq!(calls[0].from, "+15550000001");
    assert_eq!(calls[0].to, "+15551234567");

    let sender = h.sender("s1").await.unwrap();
    assert_eq!(sender.sent_today, 1);
    assert_eq!(sender.last_used_at, Some(h.clock.now()));
}

// ---- Early exits ----

#[tokio::test]
async fn no_senders_leaves_queue_untouched() {
    let h = TestHarness::builder().build().await.unwrap();
    let a = h.enqueue(msg(1)).await.unwrap();
    let b = h.enqueue(msg(2)).await.unwrap();

    let summary = h.run_batch().await.unwrap();
    assert_eq!(
        (summary.processed, summary.sent, summary.failed, summary.skipped),
        (0, 0, 0, 0)
    );
    assert_eq!(h.transport.call_count().await, 0);

    for id in [&a.id, &b.id] {
        let m = h.message(id).await.unwrap();
        assert_eq!(m.status, MessageStatus::Pending);
        assert_eq!(m.attempts, 0);
    }
}

#[tokio::test]
async fn suspended_senders_are_not_used() {
    let mut suspended = outreach_core::SenderIdentity::new("s1", "+15550000001", 100);
    suspended.status = outreach_core::SenderStatus::Suspended;
    let h = TestHarness::builder()
        .with_sender_identity(suspended)
        .build()
        .await
        .unwrap();
    h.enqueue(msg(1)).await.unwrap();

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(h.transport.call_count().await, 0);
}

#[tokio::test]
async fn disabled_dispatch_does_nothing() {
    let h = TestHarness::builder()
        .with_settings(DispatchSettings {
            enabled: false,
            delay_between_messages_ms: 0,
            ..DispatchSettings::default()
        })
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(1)).await.unwrap();

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(h.transport.call_count().await, 0);
    assert_eq!(h.message(&queued.id).await.unwrap().status, MessageStatus::Pending);
}

#[tokio::test]
async fn empty_queue_is_not_an_error() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 0);
}

// ---- Daily caps ----

#[tokio::test]
async fn daily_cap_short_circuits_the_next_batch() {
    let h = TestHarness::builder()
        .with_daily_limit(2)
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let mut ids = Vec::new();
    for n in 0..3 {
        ids.push(h.enqueue(msg(n)).await.unwrap().id);
    }

    let first = h.run_batch().await.unwrap();
    assert_eq!(first.sent, 2);

    let second = h.run_batch().await.unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(h.transport.call_count().await, 2);
    assert_eq!(h.message(&ids[2]).await.unwrap().status, MessageStatus::Pending);
}

#[tokio::test]
async fn daily_cap_leaves_stale_leases_alone() {
    let h = TestHarness::builder()
        .with_daily_limit(1)
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    h.enqueue(msg(1).with_priority(10)).await.unwrap();
    let stale = h.enqueue(msg(2)).await.unwrap();
    assert_eq!(h.run_batch().await.unwrap().sent, 1);

    let locked_until = h.clock.now() + ChronoDuration::minutes(1);
    assert!(h.storage.try_lease(&stale.id, locked_until).await.unwrap());
    h.advance(Duration::from_secs(120));

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 0);
    let m = h.message(&stale.id).await.unwrap();
    assert_eq!(m.status, MessageStatus::Processing);
    assert!(m.locked_until.is_some());
    assert_eq!(h.transport.call_count().await, 1);
}

#[tokio::test]
async fn no_senders_leaves_stale_leases_alone() {
    let h = TestHarness::builder().build().await.unwrap();
    let stale = h.enqueue(msg(1)).await.unwrap();

    let locked_until = h.clock.now() + ChronoDuration::minutes(1);
    assert!(h.storage.try_lease(&stale.id, locked_until).await.unwrap());
    h.advance(Duration::from_secs(120));

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 0);
    let m = h.message(&stale.id).await.unwrap();
    assert_eq!(m.status, MessageStatus::Processing);
    assert!(m.locked_until.is_some());
    assert_eq!(m.attempts, 0);
}

#[tokio::test]
async fn daily_cap_is_never_exceeded_across_batches() {
    let h = TestHarness::builder()
        .with_daily_limit(5)
        .with_batch_size(3)
        .with_senders(2, 100)
        .build()
        .await
        .unwrap();
    for n in 0..8 {
        h.enqueue(msg(n)).await.unwrap();
    }

    let mut total = 0;
    for _ in 0..4 {
        total += h.run_batch().await.unwrap().sent;
    }
    assert_eq!(total, 5);
    assert_eq!(h.transport.call_count().await, 5);

    let (start, end) = (
        h.clock.now() - ChronoDuration::hours(12),
        h.clock.now() + ChronoDuration::hours(12),
    );
    assert_eq!(h.storage.count_sent_between(start, end).await.unwrap(), 5);
}

#[tokio::test]
async fn daily_cap_resets_on_the_next_utc_day() {
    let h = TestHarness::builder()
        .with_daily_limit(1)
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    h.enqueue(msg(1)).await.unwrap();
    h.enqueue(msg(2)).await.unwrap();

    assert_eq!(h.run_batch().await.unwrap().sent, 1);
    assert_eq!(h.run_batch().await.unwrap().sent, 0);

    h.advance(Duration::from_secs(24 * 3600));
    assert_eq!(h.run_batch().await.unwrap().sent, 1);
}

#[tokio::test]
async fn sender_quota_exhausted_mid_batch_releases_the_lease() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 2)
        .build()
        .await
        .unwrap();
    let mut ids = Vec::new();
    for n in 0..3 {
        ids.push(h.enqueue(msg(n)).await.unwrap().id);
    }

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.processed, 2);

    let leftover = h.message(&ids[2]).await.unwrap();
    assert_eq!(leftover.status, MessageStatus::Pending);
    assert_eq!(leftover.attempts, 0);
    assert!(leftover.locked_until.is_none());

    // Exhausted sender drops out of the pool for the next batch.
    let next = h.run_batch().await.unwrap();
    assert_eq!(next.processed, 0);
}

// ---- Sender rotation ----

#[tokio::test]
async fn senders_share_the_batch_evenly() {
    let h = TestHarness::builder()
        .with_batch_size(10)
        .with_senders(3, 100)
        .build()
        .await
        .unwrap();
    for n in 0..10 {
        h.enqueue(msg(n)).await.unwrap();
    }

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.sent, 10);

    let mut total = 0;
    for i in 0..3 {
        let used = h.sender(&format!("sender-{i}")).await.unwrap().sent_today;
        assert!((3..=5).contains(&used), "sender-{i} used {used} times");
        total += used;
    }
    assert_eq!(total, 10);
}

#[tokio::test]
async fn least_used_sender_starts_the_next_batch() {
    let h = TestHarness::builder()
        .with_batch_size(1)
        .with_senders(2, 100)
        .build()
        .await
        .unwrap();
    h.enqueue(msg(1)).await.unwrap();
    h.enqueue(msg(2)).await.unwrap();

    h.run_batch().await.unwrap();
    h.run_batch().await.unwrap();

    let calls = h.transport.calls().await;
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].from, calls[1].from);
}

// ---- Retries ----

#[tokio::test]
async fn failure_schedules_retry_with_backoff() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .with_transport(MockTransport::with_script(vec![MockOutcome::Fail(
            MockTransport::server_error(),
        )]))
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(1)).await.unwrap();
    let started = h.clock.now();

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.failed, 1);

    let retried = h.message(&queued.id).await.unwrap();
    assert_eq!(retried.status, MessageStatus::Pending);
    assert_eq!(retried.attempts, 1);
    assert_eq!(retried.scheduled_for, started + ChronoDuration::minutes(5));
    assert!(retried.last_error.as_deref().unwrap().contains("server_error"));

    // Not due yet.
    assert_eq!(h.run_batch().await.unwrap().processed, 0);
}

#[tokio::test]
async fn retry_until_success_counts_every_attempt() {
    let h = TestHarness::builder()
        .with_max_attempts(3)
        .with_policy(RetryPolicy::new(3, Duration::from_secs(60)))
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(7)).await.unwrap();
    h.transport.fail_recipient(&queued.recipient, 2).await;

    assert_eq!(h.run_batch().await.unwrap().failed, 1);
    h.advance(Duration::from_secs(60));
    assert_eq!(h.run_batch().await.unwrap().failed, 1);
    h.advance(Duration::from_secs(180));
    assert_eq!(h.run_batch().await.unwrap().sent, 1);

    let done = h.message(&queued.id).await.unwrap();
    assert_eq!(done.status, MessageStatus::Sent);
    assert_eq!(done.attempts, 3);
    assert!(done.last_error.is_none());
}

#[tokio::test]
async fn exhausted_attempts_mark_message_failed() {
    let h = TestHarness::builder()
        .with_max_attempts(2)
        .with_policy(RetryPolicy::new(2, Duration::from_secs(30)))
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(9)).await.unwrap();
    h.transport.fail_recipient(&queued.recipient, 10).await;

    h.run_batch().await.unwrap();
    h.advance(Duration::from_secs(30));
    h.run_batch().await.unwrap();

    let failed = h.message(&queued.id).await.unwrap();
    assert_eq!(failed.status, MessageStatus::Failed);
    assert_eq!(failed.attempts, 2);
    assert!(failed.last_error.is_some());

    h.advance(Duration::from_secs(3600));
    assert_eq!(h.run_batch().await.unwrap().processed, 0);
    assert_eq!(h.transport.call_count().await, 2);
}

#[tokio::test]
async fn per_message_max_attempts_overrides_default() {
    let h = TestHarness::builder()
        .with_max_attempts(5)
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(3).with_max_attempts(1)).await.unwrap();
    assert_eq!(queued.max_attempts, 1);
    h.transport.fail_recipient(&queued.recipient, 1).await;

    h.run_batch().await.unwrap();
    assert_eq!(h.message(&queued.id).await.unwrap().status, MessageStatus::Failed);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_batch() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .with_transport(MockTransport::with_script(vec![
            MockOutcome::Succeed,
            MockOutcome::Fail(TransportError::new("client_error", "invalid number", false)),
            MockOutcome::Succeed,
        ]))
        .build()
        .await
        .unwrap();
    for n in 0..3 {
        h.enqueue(msg(n)).await.unwrap();
    }

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn hung_transport_times_out_as_failure() {
    let h = TestHarness::builder()
        .with_transport_timeout(Duration::from_millis(50))
        .with_sender("s1", "+15550000001", 100)
        .with_transport(MockTransport::with_script(vec![MockOutcome::Hang]))
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(1)).await.unwrap();

    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.failed, 1);

    let m = h.message(&queued.id).await.unwrap();
    assert_eq!(m.status, MessageStatus::Pending);
    assert_eq!(m.attempts, 1);
    assert!(m.last_error.as_deref().unwrap().starts_with("timeout"));
}

// ---- Leases ----

/// Transport that claims other messages mid-batch, like a competing runner.
struct RivalTransport {
    storage: Arc<SqliteStorage>,
    steal: Vec<String>,
}

#[async_trait]
impl PluginAdapter for RivalTransport {
    fn name(&self) -> &str {
        "rival"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, OutreachError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), OutreachError> {
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for RivalTransport {
    async fn send(&self, _from: &str, _to: &str, _body: &str) -> Result<SendReceipt, TransportError> {
        let until = chrono::Utc::now() + ChronoDuration::hours(1);
        for id in &self.steal {
            let _ = self.storage.try_lease(id, until).await;
        }
        Ok(SendReceipt {
            external_id: "SMrival".to_string(),
        })
    }
}

#[tokio::test]
async fn message_leased_elsewhere_is_skipped() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let first = h.enqueue(msg(1).with_priority(10)).await.unwrap();
    let second = h.enqueue(msg(2)).await.unwrap();

    let runner = DispatchRunner::new(
        h.storage.clone(),
        Arc::new(RivalTransport {
            storage: h.storage.clone(),
            steal: vec![second.id.clone()],
        }),
    )
    .with_clock(h.clock.clone());

    let summary = runner.run_batch().await.unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed, 1);

    assert_eq!(h.message(&first.id).await.unwrap().status, MessageStatus::Sent);
    let stolen = h.message(&second.id).await.unwrap();
    assert_eq!(stolen.status, MessageStatus::Processing);
    assert_eq!(stolen.attempts, 0);
}

#[tokio::test]
async fn expired_lease_is_recovered_and_sent() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(1)).await.unwrap();

    // A runner that crashed while holding the lease.
    let stale = h.clock.now() + ChronoDuration::minutes(5);
    assert!(h.storage.try_lease(&queued.id, stale).await.unwrap());
    assert_eq!(h.run_batch().await.unwrap().processed, 0);

    h.advance(Duration::from_secs(301));
    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.sent, 1);

    let m = h.message(&queued.id).await.unwrap();
    assert_eq!(m.status, MessageStatus::Sent);
    assert_eq!(m.attempts, 1);
}

// ---- Cancellation and pacing ----

#[tokio::test]
async fn cancelled_runner_sends_nothing() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(1)).await.unwrap();

    h.runner.cancellation_token().cancel();
    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.processed, 0);

    let m = h.message(&queued.id).await.unwrap();
    assert_eq!(m.status, MessageStatus::Pending);
    assert!(m.locked_until.is_none());
}

#[tokio::test]
async fn cancellation_interrupts_pacing_delay() {
    let h = TestHarness::builder()
        .with_delay_ms(60_000)
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let mut ids = Vec::new();
    for n in 0..3 {
        ids.push(h.enqueue(msg(n)).await.unwrap().id);
    }

    let token = h.runner.cancellation_token().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(10), h.run_batch())
        .await
        .expect("pacing sleep should be interrupted")
        .unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.processed, 1);
    assert_eq!(h.transport.call_count().await, 1);

    let mut pending = 0;
    for id in &ids {
        let m = h.message(id).await.unwrap();
        assert_ne!(m.status, MessageStatus::Processing);
        if m.status == MessageStatus::Pending {
            assert!(m.locked_until.is_none());
            assert_eq!(m.attempts, 0);
            pending += 1;
        }
    }
    assert_eq!(pending, 2);
}

#[tokio::test]
async fn pacing_spaces_consecutive_sends() {
    let h = TestHarness::builder()
        .with_delay_ms(40)
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    for n in 0..3 {
        h.enqueue(msg(n)).await.unwrap();
    }

    let started = std::time::Instant::now();
    let summary = h.run_batch().await.unwrap();
    assert_eq!(summary.sent, 3);
    assert!(started.elapsed() >= Duration::from_millis(80));
}

#[tokio::test]
async fn no_pacing_after_the_last_send() {
    let h = TestHarness::builder()
        .with_delay_ms(300)
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let first = h.enqueue(msg(1).with_priority(10)).await.unwrap();
    let second = h.enqueue(msg(2)).await.unwrap();
    let third = h.enqueue(msg(3)).await.unwrap();

    let runner = DispatchRunner::new(
        h.storage.clone(),
        Arc::new(RivalTransport {
            storage: h.storage.clone(),
            steal: vec![second.id.clone(), third.id.clone()],
        }),
    )
    .with_clock(h.clock.clone());

    let started = std::time::Instant::now();
    let summary = runner.run_batch().await.unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.skipped, 2);
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(h.message(&first.id).await.unwrap().status, MessageStatus::Sent);
}

// ---- Conversation ledger ----

#[tokio::test]
async fn repeated_recipient_shares_one_thread() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    h.enqueue(NewMessage::new("(555) 123-4567", "first").with_contact_ref("contact-42"))
        .await
        .unwrap();
    h.enqueue(NewMessage::new("+15551234567", "second"))
        .await
        .unwrap();

    assert_eq!(h.run_batch().await.unwrap().sent, 2);

    let thread = h
        .storage
        .get_thread_by_address("+15551234567")
        .await
        .unwrap()
        .expect("thread exists");
    assert_eq!(thread.total_messages, 2);
    assert_eq!(thread.unread_count, 0);
    assert_eq!(thread.last_message_direction, Direction::Outbound);
    assert_eq!(thread.contact_ref.as_deref(), Some("contact-42"));

    let entries = h.storage.list_log_entries(&thread.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.direction == Direction::Outbound));
    assert!(entries.iter().all(|e| e.external_id.is_some()));
}

#[tokio::test]
async fn failed_sends_are_not_logged() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let queued = h.enqueue(msg(1)).await.unwrap();
    h.transport.fail_recipient(&queued.recipient, 1).await;

    h.run_batch().await.unwrap();
    assert!(
        h.storage
            .get_thread_by_address(&queued.recipient)
            .await
            .unwrap()
            .is_none()
    );
}

// ---- Campaign counters ----

#[tokio::test]
async fn campaign_counters_follow_batch_outcomes() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let ok = h.enqueue(msg(1).with_campaign("spring")).await.unwrap();
    let bad = h
        .enqueue(msg(2).with_campaign("spring").with_max_attempts(1))
        .await
        .unwrap();
    let later = h.clock.now() + ChronoDuration::days(2);
    h.enqueue(msg(3).with_campaign("spring").with_scheduled_for(later))
        .await
        .unwrap();
    h.transport.fail_recipient(&bad.recipient, 1).await;

    h.run_batch().await.unwrap();

    assert_eq!(h.message(&ok.id).await.unwrap().status, MessageStatus::Sent);
    let campaign = h
        .storage
        .get_campaign("spring")
        .await
        .unwrap()
        .expect("campaign summary created");
    assert_eq!(campaign.counters.sent, 1);
    assert_eq!(campaign.counters.failed, 1);
    assert_eq!(campaign.counters.pending, 1);
}

#[tokio::test]
async fn untouched_campaigns_are_not_refreshed() {
    let h = TestHarness::builder()
        .with_sender("s1", "+15550000001", 100)
        .build()
        .await
        .unwrap();
    let later = h.clock.now() + ChronoDuration::days(1);
    h.enqueue(msg(1).with_campaign("autumn").with_scheduled_for(later))
        .await
        .unwrap();

    h.run_batch().await.unwrap();
    assert!(h.storage.get_campaign("autumn").await.unwrap().is_none());
}

// ---- Concurrency ----

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_batches_never_double_send() {
    let h = TestHarness::builder()
        .with_batch_size(20)
        .with_senders(2, 100)
        .build()
        .await
        .unwrap();
    for n in 0..20 {
        h.enqueue(msg(n)).await.unwrap();
    }

    let r1 = h.runner.clone();
    let r2 = h.runner.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { r1.run_batch().await }),
        tokio::spawn(async move { r2.run_batch().await }),
    );
    let total = a.unwrap().unwrap().sent + b.unwrap().unwrap().sent;
    assert_eq!(total, 20);
    assert_eq!(h.transport.call_count().await, 20);
}
