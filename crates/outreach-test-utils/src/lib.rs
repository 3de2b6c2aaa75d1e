// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Outreach integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockTransport`] - scripted transport with call capture
//! - [`ManualClock`] - clock that only moves when told to
//! - [`TestHarness`] - temp SQLite store, mock transport, and runner wired together

pub mod clock;
pub mod harness;
pub mod mock_transport;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_transport::{MockOutcome, MockTransport, SentCall};
