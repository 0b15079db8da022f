//! shoptag server
//!
//! Receives Shopify webhooks, verifies them, and tags every newly created
//! customer through the Admin API.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use anyhow::Context;
use clap::Parser;
use config::{Args, ConfigLoader};
use server::{build_router, run_server};
use shoptag_core::config::AppConfig;
use shoptag_core::events::{OutcomeReportReceiver, outcome_report_channel, tag_job_channel};
use shoptag_core::pipeline::WebhookPipeline;
use shoptag_core::processors::TagWorker;
use shoptag_core::tagging::TagMergeClient;
use shoptag_sdk::client::AdminClient;
use shutdown::shutdown_signal;
use state::AppState;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.log_json);

    tracing::info!("Starting shoptag-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let loaded_config = ConfigLoader::new(args).load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    let listen_addr = loaded_config.server.listen;
    let config = loaded_config.app;
    tracing::info!(
        shop_domain = %config.admin_api.shop_domain,
        topic = %config.tagging.topic,
        tag = %config.tagging.tag,
        ack_mode = %config.tagging.ack_mode,
        "Configuration loaded"
    );

    // Admin API client and merge client
    let merge = TagMergeClient::new(Arc::new(build_admin_client(&config)?));

    // Create event channels
    let (job_tx, job_rx) = tag_job_channel();
    let (report_tx, report_rx) = outcome_report_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn processors
    let worker_handle = tokio::spawn(
        TagWorker::new(merge.clone(), job_rx, report_tx.clone(), shutdown_rx).run(),
    );
    let reporter_handle = tokio::spawn(log_outcome_reports(report_rx));

    // Build the router
    let pipeline = WebhookPipeline::new(&config, merge, job_tx, report_tx);
    let router = build_router(AppState::new(pipeline));

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr, shutdown_signal()).await;

    // The router (and with it the pipeline's senders) is gone; let the
    // worker drain what was already accepted.
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        tracing::error!("TagWorker task failed: {}", e);
    }
    if let Err(e) = reporter_handle.await {
        tracing::error!("Outcome reporter task failed: {}", e);
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

fn build_admin_client(config: &AppConfig) -> anyhow::Result<AdminClient> {
    let http = reqwest::Client::builder()
        .timeout(config.admin_api.timeout)
        .user_agent(concat!("shoptag/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let client = AdminClient::new(
        &config.admin_api.shop_domain,
        &config.admin_api.api_version,
        config.admin_api.access_token.clone(),
    )
    .context("invalid Admin API base URL")?
    .with_http_client(http);

    tracing::debug!(base_url = %client.base_url(), "Admin API client ready");
    Ok(client)
}

/// Log a one-line summary of every tag outcome until all senders are gone.
async fn log_outcome_reports(mut reports: OutcomeReportReceiver) {
    loop {
        match reports.recv().await {
            Ok(report) => tracing::debug!(
                webhook_id = ?report.webhook_id,
                resource_id = %report.outcome.resource_id,
                kind = ?report.outcome.kind,
                status = ?report.outcome.status_code,
                finished_at = %report.finished_at,
                "Tag outcome"
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Outcome reporter lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shoptag=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
