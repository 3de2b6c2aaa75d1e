// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch dispatch for the Outreach queue.
//!
//! [`DispatchRunner::run_batch`] pulls due messages, leases them one at a
//! time, rotates them across sender identities, calls the transport, and
//! records the outcome. Supporting pieces:
//!
//! - [`RetryPolicy`]: exponential backoff between failed attempts
//! - [`SenderRotation`]: in-memory round-robin with per-batch quota
//! - [`SenderPool`]: eligible senders and atomic usage accounting
//! - [`ConversationLedger`]: per-recipient threads and the message log
//! - [`CampaignAggregator`]: recomputed campaign counters

pub mod aggregator;
pub mod backoff;
pub mod clock;
pub mod ledger;
pub mod pool;
pub mod rotation;
pub mod runner;

mod telemetry;

pub use aggregator::CampaignAggregator;
pub use backoff::RetryPolicy;
pub use clock::{Clock, SystemClock};
pub use ledger::ConversationLedger;
pub use pool::SenderPool;
pub use rotation::SenderRotation;
pub use runner::{DispatchRunner, EarlyExit, RunnerConfig};
