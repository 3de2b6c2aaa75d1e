// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Outreach dispatch queue.
//!
//! Exposes the batch trigger, enqueue, and queue inspection endpoints plus
//! unauthenticated health and metrics routes.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
