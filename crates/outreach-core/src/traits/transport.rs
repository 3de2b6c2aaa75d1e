// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport adapter trait for SMS providers.

use async_trait::async_trait;

use crate::traits::adapter::PluginAdapter;
use crate::types::{SendReceipt, TransportError};

/// Hands a single message to an external delivery provider.
///
/// Failures are returned as [`TransportError`] values; they never abort the
/// calling batch.
#[async_trait]
pub trait TransportAdapter: PluginAdapter {
    async fn send(&self, from: &str, to: &str, body: &str) -> Result<SendReceipt, TransportError>;
}
