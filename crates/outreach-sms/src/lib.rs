// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio SMS transport for the Outreach dispatch queue.
//!
//! Implements [`TransportAdapter`] on top of the Twilio Messages REST API.
//! Construction fails fast when credentials are missing; individual send
//! failures come back as [`TransportError`] values.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use outreach_config::model::TwilioConfig;
use outreach_core::{
    AdapterType, HealthStatus, OutreachError, PluginAdapter, SendReceipt, TransportAdapter,
    TransportError,
};

pub use client::TwilioClient;

/// Twilio-backed [`TransportAdapter`].
#[derive(Debug, Clone)]
pub struct TwilioTransport {
    client: TwilioClient,
}

impl TwilioTransport {
    /// `timeout` bounds each HTTP request; the runner applies its own bound on top.
    pub fn new(config: &TwilioConfig, timeout: Duration) -> Result<Self, OutreachError> {
        let client = TwilioClient::new(config, timeout)?;
        debug!(account_sid = client.account_sid(), "twilio transport configured");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for TwilioTransport {
    fn name(&self) -> &str {
        "twilio"
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
impl TransportAdapter for TwilioTransport {
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<SendReceipt, TransportError> {
        let resource = self.client.create_message(from, to, body).await?;
        debug!(sid = %resource.sid, status = ?resource.status, "twilio accepted message");
        Ok(SendReceipt {
            external_id: resource.sid,
        })
    }
}
