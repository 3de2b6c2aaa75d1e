// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Outreach metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "outreach_messages_sent_total",
        "Messages handed to the transport successfully"
    );
    describe_counter!(
        "outreach_messages_failed_total",
        "Send attempts that failed, including ones rescheduled for retry"
    );
    describe_counter!(
        "outreach_leases_skipped_total",
        "Messages skipped because another runner leased them first"
    );
    describe_gauge!(
        "outreach_senders_eligible",
        "Sender identities with remaining daily quota at batch start"
    );
    describe_histogram!(
        "outreach_batch_duration_seconds",
        "Wall-clock duration of a dispatch batch"
    );
}

pub fn record_sent(sender: &str) {
    metrics::counter!("outreach_messages_sent_total", "sender" => sender.to_string()).increment(1);
}

/// Record a failed attempt, labelled by transport error code.
pub fn record_failed(code: &str) {
    metrics::counter!("outreach_messages_failed_total", "code" => code.to_string()).increment(1);
}

pub fn record_lease_skipped() {
    metrics::counter!("outreach_leases_skipped_total").increment(1);
}

pub fn set_eligible_senders(count: usize) {
    metrics::gauge!("outreach_senders_eligible").set(count as f64);
}

pub fn record_batch_duration(seconds: f64) {
    metrics::histogram!("outreach_batch_duration_seconds").record(seconds);
}
