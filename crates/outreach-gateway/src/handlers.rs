// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use outreach_core::{MessageStatus, NewMessage, OutreachError};

use crate::server::GatewayState;

/// Response body for `POST /v1/messages`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnqueueResponse {
    pub id: String,
    pub status: MessageStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An [`OutreachError`] rendered as a JSON error response.
pub struct ApiError(pub OutreachError);

impl From<OutreachError> for ApiError {
    fn from(err: OutreachError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            OutreachError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OutreachError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text format; 404 when metrics are disabled.
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /v1/dispatch/run
///
/// Runs one batch and returns its summary. A nothing-to-do batch is still 200.
pub async fn post_dispatch_run(State(state): State<GatewayState>) -> Result<Response, ApiError> {
    let summary = state.runner.run_batch().await?;
    Ok((StatusCode::OK, Json(summary)).into_response())
}

/// POST /v1/messages
pub async fn post_messages(
    State(state): State<GatewayState>,
    Json(msg): Json<NewMessage>,
) -> Result<Response, ApiError> {
    msg.validate()?;
    let settings = state.store.load_settings().await?;
    let queued = state
        .store
        .enqueue(&msg, settings.default_max_attempts)
        .await?;
    tracing::debug!(message_id = %queued.id, campaign_id = ?queued.campaign_id, "message enqueued");
    Ok((
        StatusCode::CREATED,
        Json(EnqueueResponse {
            id: queued.id,
            status: queued.status,
        }),
    )
        .into_response())
}

/// GET /v1/messages/{id}
pub async fn get_message(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let found = state.store.get_message(&id).await?;
    let msg = found.ok_or(OutreachError::NotFound {
        entity: "message".to_string(),
        id,
    })?;
    Ok(Json(msg).into_response())
}

/// GET /v1/campaigns/{id}
pub async fn get_campaign(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let found = state.store.get_campaign(&id).await?;
    let campaign = found.ok_or(OutreachError::NotFound {
        entity: "campaign".to_string(),
        id,
    })?;
    Ok(Json(campaign).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_response_uses_snake_case_status() {
        let resp = EnqueueResponse {
            id: "m1".to_string(),
            status: MessageStatus::Pending,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"id":"m1","status":"pending"}"#);
    }

    #[test]
    fn error_status_follows_error_kind() {
        let resp = ApiError(OutreachError::InvalidInput("body must not be empty".into()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = ApiError(OutreachError::NotFound {
            entity: "campaign".into(),
            id: "x".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError(OutreachError::Config("no settings".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
