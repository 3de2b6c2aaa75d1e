// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process interval trigger for dispatch batches.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use outreach_dispatch::DispatchRunner;

/// Call [`DispatchRunner::run_batch`] every `every` until `cancel` fires.
///
/// The first batch runs immediately. A slow batch delays the next tick
/// instead of causing a burst of catch-up runs. Batch errors are logged
/// and the loop keeps going.
pub async fn run_scheduler(runner: Arc<DispatchRunner>, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = every.as_secs(), "dispatch scheduler started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match runner.run_batch().await {
                    Ok(summary) => debug!(
                        processed = summary.processed,
                        sent = summary.sent,
                        "scheduled batch finished"
                    ),
                    Err(e) => error!(error = %e, "scheduled dispatch batch failed"),
                }
            }
            _ = cancel.cancelled() => {
                info!("dispatch scheduler shutting down");
                break;
            }
        }
    }
}
