// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Twilio Messages API.
//!
//! One request per send and no retries here: retry timing belongs to the
//! dispatch runner's policy. Every failure is mapped to a typed
//! [`TransportError`].

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::debug;

use outreach_config::model::TwilioConfig;
use outreach_core::{OutreachError, TransportError};

use crate::types::{ApiErrorResponse, CreateMessage, MessageResource};

const API_VERSION: &str = "2010-04-01";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Clone)]
pub struct TwilioClient {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[redacted]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TwilioClient {
    /// Build a client from the `[twilio]` section.
    ///
    /// Missing or blank credentials are a configuration error.
    pub fn new(config: &TwilioConfig, timeout: Duration) -> Result<Self, OutreachError> {
        let account_sid = required(config.account_sid.as_deref(), "twilio.account_sid")?;
        let auth_token = required(config.auth_token.as_deref(), "twilio.auth_token")?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| OutreachError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }

    /// Create one outbound message and return the provider's resource.
    pub async fn create_message(
        &self,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<MessageResource, TransportError> {
        let form = serde_urlencoded::to_string(CreateMessage { to, from, body })
            .map_err(|e| TransportError::new("invalid_request", e.to_string(), false))?;

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
            .body(form)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        debug!(status = %status, "twilio response received");

        let text = response.text().await.map_err(request_error)?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        serde_json::from_str::<MessageResource>(&text).map_err(|e| {
            TransportError::new(
                "invalid_response",
                format!("unreadable message resource: {e}"),
                false,
            )
        })
    }
}

fn required(value: Option<&str>, key: &str) -> Result<String, OutreachError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(OutreachError::Config(format!("{key} is required for the Twilio transport"))),
    }
}

fn request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::new("timeout", format!("twilio request timed out: {e}"), true)
    } else {
        TransportError::new("network", format!("twilio request failed: {e}"), true)
    }
}

/// Map a non-2xx response to a transport error.
pub(crate) fn status_error(status: StatusCode, body: &str) -> TransportError {
    let detail = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(ApiErrorResponse {
            code: Some(code),
            message: Some(message),
        }) => format!("{status} ({code}): {message}"),
        Ok(ApiErrorResponse {
            message: Some(message),
            ..
        }) => format!("{status}: {message}"),
        _ => format!("{status}: {body}"),
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        TransportError::new("rate_limited", detail, true)
    } else if status.is_client_error() {
        TransportError::new("client_error", detail, false)
    } else {
        TransportError::new("server_error", detail, true)
    }
}
