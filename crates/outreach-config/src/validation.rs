// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-zero batch sizes, backoff bases, and valid bind hosts.

use crate::diagnostic::ConfigError;
use crate::model::OutreachConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &OutreachConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let dispatch = &config.dispatch;
    if dispatch.batch_size < 1 {
        fail("dispatch.batch_size must be at least 1".to_string());
    }
    if dispatch.default_max_attempts < 1 {
        fail(format!(
            "dispatch.default_max_attempts must be at least 1, got {}",
            dispatch.default_max_attempts
        ));
    }
    if dispatch.transport_timeout_secs < 1 {
        fail("dispatch.transport_timeout_secs must be at least 1".to_string());
    }
    // A lease covers the pacing pause plus one transport call.
    let held_ms = dispatch
        .delay_between_messages_ms
        .saturating_add(dispatch.transport_timeout_secs.saturating_mul(1000));
    if dispatch.lease_timeout_secs.saturating_mul(1000) <= held_ms {
        fail(format!(
            "dispatch.lease_timeout_secs ({}) must exceed dispatch.delay_between_messages_ms ({}) \
             plus dispatch.transport_timeout_secs ({})",
            dispatch.lease_timeout_secs,
            dispatch.delay_between_messages_ms,
            dispatch.transport_timeout_secs
        ));
    }

    let retry = &config.retry;
    if retry.base < 2 {
        fail(format!(
            "retry.base must be at least 2 so delays strictly increase, got {}",
            retry.base
        ));
    }
    if retry.unit_secs < 1 {
        fail("retry.unit_secs must be at least 1".to_string());
    }
    if retry.max_delay_secs < retry.unit_secs {
        fail(format!(
            "retry.max_delay_secs ({}) must not be below retry.unit_secs ({})",
            retry.max_delay_secs, retry.unit_secs
        ));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.scheduler.interval_secs < 1 {
        fail("scheduler.interval_secs must be at least 1".to_string());
    }

    if config.twilio.api_base_url.trim().is_empty() {
        fail("twilio.api_base_url must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&OutreachConfig::default()).is_ok());
    }

    #[test]
    fn zero_max_attempts_fails_validation() {
        let mut config = OutreachConfig::default();
        config.dispatch.default_max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "default_max_attempts"));
    }

    #[test]
    fn retry_base_below_two_fails_validation() {
        let mut config = OutreachConfig::default();
        config.retry.base = 1;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "retry.base"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = OutreachConfig::default();
        config.storage.database_path = " ".to_string();
        config.dispatch.batch_size = 0;
        config.scheduler.interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn bad_gateway_host_fails_validation() {
        let mut config = OutreachConfig::default();
        config.gateway.host = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "gateway.host"));
    }

    #[test]
    fn lease_must_outlive_transport_timeout() {
        let mut config = OutreachConfig::default();
        config.dispatch.transport_timeout_secs = 60;
        config.dispatch.lease_timeout_secs = 30;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "lease_timeout_secs"));
    }

    #[test]
    fn lease_must_outlive_pacing_plus_transport() {
        let mut config = OutreachConfig::default();
        config.dispatch.transport_timeout_secs = 30;
        config.dispatch.delay_between_messages_ms = 45_000;
        config.dispatch.lease_timeout_secs = 60;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "delay_between_messages_ms"));

        config.dispatch.lease_timeout_secs = 76;
        assert!(validate_config(&config).is_ok());
    }
}
