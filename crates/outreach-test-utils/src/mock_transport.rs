// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport adapter for deterministic testing.
//!
//! `MockTransport` implements `TransportAdapter` with scripted outcomes and
//! captures every call for assertion in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use outreach_core::{
    AdapterType, HealthStatus, OutreachError, PluginAdapter, SendReceipt, TransportAdapter,
    TransportError,
};

/// What the next scripted call does.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Succeed,
    Fail(TransportError),
    /// Never completes, so the caller's timeout fires.
    Hang,
}

/// One captured call to `send()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCall {
    pub from: String,
    pub to: String,
    pub body: String,
}

/// A mock SMS transport.
///
/// Outcome precedence per call: a per-recipient failure budget, then the
/// scripted queue, then success.
pub struct MockTransport {
    script: Mutex<VecDeque<MockOutcome>>,
    recipient_failures: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<SentCall>>,
    latency: Option<Duration>,
    next_id: AtomicU64,
}

impl MockTransport {
    /// A transport where every send succeeds.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            recipient_failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            latency: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Outcomes consumed one per call, in order; success once exhausted.
    pub fn with_script(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            ..Self::new()
        }
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next `times` sends to `recipient`, then succeed.
    pub async fn fail_recipient(&self, recipient: &str, times: u32) {
        self.recipient_failures
            .lock()
            .await
            .insert(recipient.to_string(), times);
    }

    pub async fn push_outcome(&self, outcome: MockOutcome) {
        self.script.lock().await.push_back(outcome);
    }

    pub async fn calls(&self) -> Vec<SentCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    /// Convenience error used by scripted failures.
    pub fn server_error() -> TransportError {
        TransportError::new("server_error", "mock provider returned 503", true)
    }

    async fn next_outcome(&self, to: &str) -> MockOutcome {
        if let Some(remaining) = self.recipient_failures.lock().await.get_mut(to)
            && *remaining > 0
        {
            *remaining -= 1;
            return MockOutcome::Fail(Self::server_error());
        }
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(MockOutcome::Succeed)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
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
impl TransportAdapter for MockTransport {
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<SendReceipt, TransportError> {
        self.calls.lock().await.push(SentCall {
            from: from.to_string(),
            to: to.to_string(),
            body: body.to_string(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.next_outcome(to).await {
            MockOutcome::Succeed => {
                let n = self.next_id.fetch_add(1, Ordering::Relaxed);
                Ok(SendReceipt {
                    external_id: format!("SM{n:032}"),
                })
            }
            MockOutcome::Fail(err) => Err(err),
            MockOutcome::Hang => {
                std::future::pending::<()>().await;
                Err(TransportError::new("unreachable", "pending future resolved", false))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn succeeds_by_default_and_captures_calls() {
        let transport = MockTransport::new();
        let receipt = transport.send("+1000", "+2000", "hi").await.unwrap();
        assert!(receipt.external_id.starts_with("SM"));
        assert_eq!(
            transport.calls().await,
            vec![SentCall {
                from: "+1000".into(),
                to: "+2000".into(),
                body: "hi".into()
            }]
        );
    }

    #[tokio::test]
    async fn script_is_consumed_in_order() {
        let transport = MockTransport::with_script(vec![
            MockOutcome::Fail(MockTransport::server_error()),
            MockOutcome::Succeed,
        ]);
        assert!(transport.send("a", "b", "x").await.is_err());
        assert!(transport.send("a", "b", "x").await.is_ok());
        assert!(transport.send("a", "b", "x").await.is_ok());
    }

    #[tokio::test]
    async fn recipient_failures_run_out() {
        let transport = MockTransport::new();
        transport.fail_recipient("+2000", 2).await;
        assert!(transport.send("a", "+2000", "x").await.is_err());
        assert!(transport.send("a", "+3000", "x").await.is_ok());
        assert!(transport.send("a", "+2000", "x").await.is_err());
        assert!(transport.send("a", "+2000", "x").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn hang_never_completes() {
        let transport = MockTransport::with_script(vec![MockOutcome::Hang]);
        let result =
            tokio::time::timeout(Duration::from_secs(1), transport.send("a", "b", "x")).await;
        assert!(result.is_err());
    }
}
