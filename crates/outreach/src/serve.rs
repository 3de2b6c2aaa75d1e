// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `outreach serve` and `outreach run-once` implementations.
//!
//! Both open the SQLite store (seeding the settings record from `[dispatch]`),
//! configure the Twilio transport, and build a [`DispatchRunner`]. `serve`
//! then drives the runner from the interval scheduler and the HTTP gateway
//! until a shutdown signal arrives.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use outreach_config::OutreachConfig;
use outreach_core::{OutreachError, StorageAdapter};
use outreach_dispatch::{DispatchRunner, RetryPolicy, RunnerConfig};
use outreach_sms::TwilioTransport;
use outreach_storage::SqliteStorage;

use crate::{scheduler, shutdown};

/// Everything a dispatch process needs, wired from configuration.
struct Services {
    storage: Arc<SqliteStorage>,
    runner: Arc<DispatchRunner>,
    #[cfg_attr(not(feature = "gateway"), allow(dead_code))]
    prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

async fn build_services(
    config: &OutreachConfig,
    cancel: CancellationToken,
) -> Result<Services, OutreachError> {
    #[cfg(feature = "prometheus")]
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        if config.prometheus.enabled {
            match outreach_prometheus::PrometheusAdapter::new() {
                Ok(adapter) => {
                    info!("prometheus metrics enabled");
                    let adapter = Arc::new(adapter);
                    Some(Arc::new(move || adapter.render()))
                }
                Err(e) => {
                    warn!(error = %e, "prometheus initialization failed, continuing without metrics");
                    None
                }
            }
        } else {
            debug!("prometheus metrics disabled by configuration");
            None
        };
    #[cfg(not(feature = "prometheus"))]
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> = None;

    let storage = SqliteStorage::new(config.storage.clone())
        .with_seed_settings(config.dispatch.to_settings());
    storage.initialize().await?;
    let storage = Arc::new(storage);
    info!(path = %config.storage.database_path, "storage initialized");

    let transport = TwilioTransport::new(&config.twilio, config.dispatch.transport_timeout())?;

    let runner = DispatchRunner::new(storage.clone(), Arc::new(transport))
        .with_policy(RetryPolicy::from_config(&config.retry))
        .with_config(RunnerConfig::from_config(&config.dispatch))
        .with_cancellation(cancel);

    Ok(Services {
        storage,
        runner: Arc::new(runner),
        prometheus_render,
    })
}

/// Run the scheduler and gateway until SIGINT/SIGTERM.
pub async fn run_serve(config: OutreachConfig) -> Result<(), OutreachError> {
    init_tracing(&config.service.log_level);
    info!(name = %config.service.name, version = env!("CARGO_PKG_VERSION"), "starting outreach");

    let cancel = shutdown::install_signal_handler();
    let services = build_services(&config, cancel.clone()).await?;

    let mut tasks = tokio::task::JoinSet::new();

    if config.scheduler.enabled {
        let every = std::time::Duration::from_secs(config.scheduler.interval_secs);
        tasks.spawn(scheduler::run_scheduler(
            services.runner.clone(),
            every,
            cancel.clone(),
        ));
    } else {
        info!("interval scheduler disabled; batches run only on request");
    }

    #[cfg(feature = "gateway")]
    {
        if config.gateway.enabled {
            let server_config = outreach_gateway::ServerConfig::from(&config.gateway);
            let state = outreach_gateway::GatewayState {
                store: services.storage.clone(),
                runner: services.runner.clone(),
                auth: outreach_gateway::AuthConfig {
                    bearer_token: config.gateway.bearer_token.clone(),
                },
                health: outreach_gateway::HealthState {
                    start_time: std::time::Instant::now(),
                    prometheus_render: services.prometheus_render.clone(),
                },
            };
            if state.auth.bearer_token.is_none() {
                warn!(host = %server_config.host, "gateway has no bearer token; /v1 routes are open");
            }
            let gateway_cancel = cancel.clone();
            tasks.spawn(async move {
                if let Err(e) =
                    outreach_gateway::start_server(&server_config, state, gateway_cancel.clone()).await
                {
                    tracing::error!(error = %e, "gateway failed, shutting down");
                    gateway_cancel.cancel();
                }
            });
        } else {
            debug!("gateway disabled by configuration");
        }
    }

    cancel.cancelled().await;
    info!("shutdown requested, waiting for in-flight work");
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "background task ended abnormally");
        }
    }

    services.storage.close().await?;
    info!("outreach shutdown complete");
    Ok(())
}

/// Run a single batch and print the summary to stdout.
pub async fn run_once(config: OutreachConfig) -> Result<(), OutreachError> {
    init_tracing(&config.service.log_level);

    let cancel = shutdown::install_signal_handler();
    let services = build_services(&config, cancel).await?;

    let outcome = services.runner.run_batch().await;
    services.storage.close().await?;
    let summary = outcome?;

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| OutreachError::Internal(format!("failed to render summary: {e}")))?;
    println!("{json}");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("outreach={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
