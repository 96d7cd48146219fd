//! One-shot dashboard commands.
//!
//! Each command runs a single aggregation cycle against the backend plus
//! whatever side effect it is for: persisting the connection, queueing a
//! sync, or just printing the snapshot. Handlers take the data service as a
//! trait object so tests drive them with mocks.

use crate::backend::DataService;
use crate::config::Config;
use crate::consts::cli_consts::refresh;
use crate::environment::Environment;
use crate::refresh::Aggregator;
use crate::snapshot::{ConnectionState, ViewSnapshot};
use chrono::Local;
use std::error::Error;
use std::path::Path;
use std::time::Duration;

/// Resolve the backend base URL: explicit flag, then config file, then the
/// environment default.
pub fn resolve_base_url(flag: Option<&str>, config: Option<&Config>, env: &Environment) -> String {
    if let Some(url) = flag {
        return url.to_string();
    }
    if let Some(url) = config.and_then(|c| c.base_url.as_deref()) {
        return url.to_string();
    }
    env.hub_url()
}

/// Resolve the refresh interval: explicit flag, then config override, then
/// the built-in default.
pub fn resolve_refresh_interval(flag_secs: Option<u64>, config: Option<&Config>) -> Duration {
    let secs = flag_secs
        .or_else(|| config.and_then(|c| c.refresh_secs))
        .unwrap_or(refresh::INTERVAL_SECS);
    Duration::from_secs(secs)
}

/// Connects the CLI to a backend.
///
/// Probes the backend with one full aggregation cycle so a bad URL is
/// rejected before anything is persisted, then writes the config file with a
/// fresh client id. An existing refresh-interval override survives the
/// reconnect.
pub async fn connect(
    base_url: String,
    config_path: &Path,
    service: Box<dyn DataService>,
) -> Result<(), Box<dyn Error>> {
    crate::print_cmd_info!("Connecting", "Probing backend at {}", base_url);

    let aggregator = Aggregator::new(service);
    let snapshot = match aggregator.run_cycle().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let details = e.to_string();
            crate::print_cmd_error!("Could not reach the backend.", details.as_str());
            return Err(e.into());
        }
    };

    // Keep an existing interval override across reconnects.
    let refresh_secs = Config::load_from_file(config_path)
        .ok()
        .and_then(|existing| existing.refresh_secs);

    let config = Config {
        client_id: uuid::Uuid::new_v4().to_string(),
        base_url: Some(base_url),
        refresh_secs,
    };
    config
        .save(config_path)
        .map_err(|e| format!("Failed to save config: {}", e))?;

    crate::print_cmd_success!(
        "Connected.",
        "{} active sources, {} orders total. Config saved to {}",
        snapshot.active_sources.len(),
        snapshot.statistics.total_orders,
        config_path.display()
    );
    Ok(())
}

/// Fetches one snapshot and prints a console summary.
///
/// Returns `Err` when the backend is unreachable so scripted callers get a
/// nonzero exit status.
pub async fn status(service: Box<dyn DataService>) -> Result<(), Box<dyn Error>> {
    let aggregator = Aggregator::new(service);
    match aggregator.run_cycle().await {
        Ok(snapshot) => {
            print_snapshot_summary(&snapshot);
            Ok(())
        }
        Err(e) => {
            let details = e.to_string();
            crate::print_cmd_error!("Could not fetch dashboard data.", details.as_str());
            Err(e.into())
        }
    }
}

/// Queues a backend sync for one source, then refreshes once so the printed
/// summary reflects the queued work.
pub async fn sync_source(
    source_id: &str,
    service: Box<dyn DataService>,
) -> Result<(), Box<dyn Error>> {
    if let Err(e) = service.trigger_sync(source_id).await {
        let details = e.to_string();
        crate::print_cmd_error!("Failed to queue sync.", details.as_str());
        return Err(e.into());
    }
    crate::print_cmd_info!("Sync queued", "Source: {}", source_id);

    let aggregator = Aggregator::new(service);
    match aggregator.run_cycle().await {
        Ok(snapshot) => {
            crate::print_cmd_success!(
                "Sync request accepted.",
                "{} jobs pending, {} failed",
                snapshot.statistics.pending_queue,
                snapshot.statistics.failed_jobs
            );
            Ok(())
        }
        Err(e) => {
            // The sync was accepted; only the follow-up refresh failed.
            crate::print_cmd_warn!("Sync queued, but the follow-up refresh failed", "{}", e);
            Ok(())
        }
    }
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

fn state_color(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connected => GREEN,
        ConnectionState::Disconnected => RED,
        ConnectionState::Draft => YELLOW,
        ConnectionState::Unknown => DIM,
    }
}

/// Render a snapshot as a console summary.
pub fn print_snapshot_summary(snapshot: &ViewSnapshot) {
    let stats = &snapshot.statistics;
    println!(
        "Orders:     {} total, {} today",
        stats.total_orders, stats.orders_today
    );
    println!(
        "Products:   {} total, {} synced",
        stats.total_products, stats.sync_products
    );
    println!("Customers:  {}", stats.total_customers);
    println!("Revenue:    {:.2}", stats.total_revenue);
    println!(
        "Queue:      {} pending, {} failed",
        stats.pending_queue, stats.failed_jobs
    );

    println!();
    println!("Active sources ({})", snapshot.active_sources.len());
    for source in &snapshot.active_sources {
        println!(
            "  {}[{}]{} {} ({}) {}",
            state_color(source.connection_state),
            source.connection_state,
            RESET,
            source.display_name,
            source.identifier,
            source.endpoint_url
        );
    }

    println!();
    println!(
        "Recent transactions ({})",
        snapshot.recent_transactions.len()
    );
    for tx in &snapshot.recent_transactions {
        println!(
            "  {}  {:>10.2}  {}  {}/{}",
            tx.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            tx.amount,
            tx.identifier,
            tx.payment_state,
            tx.fulfillment_state
        );
    }

    println!();
    println!("Recent events ({})", snapshot.recent_events.len());
    for event in &snapshot.recent_events {
        println!(
            "  {}  [{}] {} ({})",
            event.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            event.severity,
            event.message,
            event.source_model
        );
    }
}
