// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch settings persistence.

use async_trait::async_trait;

use crate::error::OutreachError;
use crate::types::DispatchSettings;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the singleton settings record.
    ///
    /// A missing record is a configuration error.
    async fn load_settings(&self) -> Result<DispatchSettings, OutreachError>;

    async fn save_settings(&self, settings: &DispatchSettings) -> Result<(), OutreachError>;
}
