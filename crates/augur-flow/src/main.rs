//! Headless report runner.
//!
//! Runs one gate -> submit -> poll -> route cycle against the configured
//! backend and prints the resulting route as JSON.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use augur_client::{ApiClient, ApiConfig, InMemorySnapshotCache, StaticToken};
use augur_flow::{FlowConfig, FlowOutcome, ReportFlow};
use augur_models::ServiceType;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("augur=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let service: ServiceType = std::env::var("AUGUR_SERVICE")
        .context("AUGUR_SERVICE must be set")?
        .parse()?;
    let payload: serde_json::Value = match std::env::var("AUGUR_PAYLOAD") {
        Ok(raw) => serde_json::from_str(&raw).context("AUGUR_PAYLOAD is not valid JSON")?,
        Err(_) => serde_json::json!({}),
    };

    let api_config = ApiConfig::from_env()?;
    let flow_config = FlowConfig::from_env()?;
    info!(
        base_url = %api_config.base_url,
        poll_interval_ms = flow_config.poll_interval.as_millis() as u64,
        "Starting augur-run"
    );

    let client = Arc::new(ApiClient::new(api_config, Arc::new(StaticToken::from_env()))?);
    let cache = Arc::new(InMemorySnapshotCache::new());
    let mut flow = ReportFlow::new(client.clone(), client, cache, &flow_config);

    let outcome = tokio::select! {
        outcome = flow.run(&service, &payload) => outcome,
        // Dropping the run future closes the tracker.
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling report flow");
            bail!("report flow cancelled");
        }
    };

    match outcome {
        Ok(FlowOutcome::Routed(route)) => {
            println!("{}", serde_json::to_string_pretty(&route)?);
            Ok(())
        }
        Ok(FlowOutcome::Unsupported(record)) => {
            bail!("report {} has unsupported type {}", record.id, record.service_type)
        }
        Ok(FlowOutcome::TopUpRequired(decision)) => {
            bail!(
                "insufficient {} credits for {}: need {}, have {}",
                decision.credit_type,
                decision.service_key,
                decision.cost,
                decision.available
            )
        }
        Err(e) => {
            if e.is_snapshot_failure() {
                if let Some(snapshot) = flow.last_known().await {
                    warn!(
                        silver = snapshot.balance.silver,
                        gold = snapshot.balance.gold,
                        age_secs = snapshot.age_secs(),
                        "Showing last-known balance"
                    );
                }
            }
            Err(e.into())
        }
    }
}
