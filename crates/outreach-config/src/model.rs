// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Outreach dispatch queue.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use outreach_core::DispatchSettings;
use serde::{Deserialize, Serialize};

/// Top-level Outreach configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutreachConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Batch sizing and daily caps. Seeds the persisted settings record.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Backoff between failed attempts.
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub twilio: TwilioConfig,

    /// HTTP trigger, enqueue, and inspection endpoints.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// In-process interval trigger for `outreach serve`.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Service identity and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "outreach".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("outreach").join("outreach.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("outreach.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Dispatch runner configuration.
///
/// The first five fields seed the `dispatch_settings` record on first open;
/// afterwards the stored record is authoritative.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_delay_between_messages_ms")]
    pub delay_between_messages_ms: u64,

    #[serde(default = "default_global_daily_limit")]
    pub global_daily_limit: u32,

    /// Applied at enqueue time when a message does not carry its own limit.
    #[serde(default = "default_max_attempts")]
    pub default_max_attempts: u32,

    /// Upper bound on a single transport call.
    #[serde(default = "default_transport_timeout_secs")]
    pub transport_timeout_secs: u64,

    /// How long a leased message may stay `processing` before it is recovered.
    #[serde(default = "default_lease_timeout_secs")]
    pub lease_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: default_batch_size(),
            delay_between_messages_ms: default_delay_between_messages_ms(),
            global_daily_limit: default_global_daily_limit(),
            default_max_attempts: default_max_attempts(),
            transport_timeout_secs: default_transport_timeout_secs(),
            lease_timeout_secs: default_lease_timeout_secs(),
        }
    }
}

impl DispatchConfig {
    /// The settings record seeded into storage on first open.
    pub fn to_settings(&self) -> DispatchSettings {
        DispatchSettings {
            enabled: self.enabled,
            batch_size: self.batch_size,
            delay_between_messages_ms: self.delay_between_messages_ms,
            global_daily_limit: self.global_daily_limit,
            default_max_attempts: self.default_max_attempts,
        }
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_secs(self.transport_timeout_secs)
    }

    pub fn lease_timeout(&self) -> Duration {
        Duration::from_secs(self.lease_timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> u32 {
    50
}

fn default_delay_between_messages_ms() -> u64 {
    1000
}

fn default_global_daily_limit() -> u32 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_transport_timeout_secs() -> u64 {
    30
}

fn default_lease_timeout_secs() -> u64 {
    300
}

/// Exponential backoff: `base^(attempt-1) * unit_secs`, optionally jittered
/// and capped.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_retry_base")]
    pub base: u32,

    #[serde(default = "default_retry_unit_secs")]
    pub unit_secs: u64,

    /// Upper bound of random delay added to each backoff. 0 disables jitter.
    #[serde(default)]
    pub jitter_secs: u64,

    #[serde(default = "default_retry_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base: default_retry_base(),
            unit_secs: default_retry_unit_secs(),
            jitter_secs: 0,
            max_delay_secs: default_retry_max_delay_secs(),
        }
    }
}

fn default_retry_base() -> u32 {
    3
}

fn default_retry_unit_secs() -> u64 {
    300
}

fn default_retry_max_delay_secs() -> u64 {
    86_400
}

/// Twilio REST API credentials.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    /// Account SID. `None` leaves the transport unconfigured.
    #[serde(default)]
    pub account_sid: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default = "default_twilio_api_base_url")]
    pub api_base_url: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            api_base_url: default_twilio_api_base_url(),
        }
    }
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn default_twilio_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

/// HTTP gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// When set, `/v1/*` routes require `Authorization: Bearer <token>`.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3100
}

/// Interval trigger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

/// Prometheus metrics exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_defaults_seed_matching_settings() {
        let settings = DispatchConfig::default().to_settings();
        assert_eq!(settings, DispatchSettings::default());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let twilio = TwilioConfig {
            account_sid: Some("AC123".into()),
            auth_token: Some("super-secret".into()),
            ..TwilioConfig::default()
        };
        let rendered = format!("{twilio:?}");
        assert!(rendered.contains("AC123"));
        assert!(!rendered.contains("super-secret"));

        let gateway = GatewayConfig {
            bearer_token: Some("tok-456".into()),
            ..GatewayConfig::default()
        };
        assert!(!format!("{gateway:?}").contains("tok-456"));
    }

    #[test]
    fn retry_section_deny_unknown_fields() {
        let result = toml::from_str::<OutreachConfig>("[retry]\nfactor = 2\n");
        assert!(result.is_err());
    }

    #[test]
    fn timeouts_convert_to_durations() {
        let dispatch = DispatchConfig {
            transport_timeout_secs: 5,
            lease_timeout_secs: 120,
            ..DispatchConfig::default()
        };
        assert_eq!(dispatch.transport_timeout(), Duration::from_secs(5));
        assert_eq!(dispatch.lease_timeout(), Duration::from_secs(120));
    }
}
