// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric hooks, compiled to no-ops without the `prometheus` feature.

#[cfg(feature = "prometheus")]
pub(crate) use outreach_prometheus::recording::{
    record_batch_duration, record_failed, record_lease_skipped, record_sent, set_eligible_senders,
};

#[cfg(not(feature = "prometheus"))]
mod noop {
    pub(crate) fn record_sent(_sender: &str) {}
    pub(crate) fn record_failed(_code: &str) {}
    pub(crate) fn record_lease_skipped() {}
    pub(crate) fn set_eligible_senders(_count: usize) {}
    pub(crate) fn record_batch_duration(_seconds: f64) {}
}

#[cfg(not(feature = "prometheus"))]
pub(crate) use noop::*;
