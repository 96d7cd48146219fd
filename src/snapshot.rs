//! Dashboard Snapshot
//!
//! The composed value a refresh cycle produces: aggregate statistics plus
//! the active sources and the most recent transactions and events. A
//! snapshot is built only when all four constituent fetches of one cycle
//! succeed, so its fields are always from the same generation.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Aggregate counters reported by the statistics endpoint.
///
/// Missing keys decode as zero so an older backend cannot fail the cycle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub orders_today: u64,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub sync_products: u64,
    #[serde(default)]
    pub total_customers: u64,
    #[serde(default)]
    pub pending_queue: u64,
    #[serde(default)]
    pub failed_jobs: u64,
    #[serde(default)]
    pub total_revenue: f64,
}

/// Connection lifecycle of a configured source.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Draft,
    /// State this client version does not know about.
    #[serde(other)]
    Unknown,
}

/// One configured store source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceInfo {
    pub identifier: String,
    pub display_name: String,
    #[serde(default)]
    pub endpoint_url: String,
    pub connection_state: ConnectionState,
}

/// Payment status of a transaction.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentState {
    #[default]
    Pending,
    Authorized,
    PartiallyPaid,
    Paid,
    PartiallyRefunded,
    Refunded,
    Voided,
    #[serde(other)]
    Unknown,
}

/// Fulfillment status of a transaction. Absent on the wire means unfulfilled.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FulfillmentState {
    Fulfilled,
    Partial,
    Restocked,
    #[default]
    Unfulfilled,
    #[serde(other)]
    Unknown,
}

/// One imported order, as listed by the recent-transactions endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    pub identifier: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub payment_state: PaymentState,
    #[serde(default)]
    pub fulfillment_state: FulfillmentState,
}

/// Severity of a backend log entry.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    // The backend emits both "info" and "success" entries.
    #[serde(alias = "success")]
    #[default]
    Info,
    Debug,
}

/// One backend log entry, as listed by the recent-events endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRecord {
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub source_model: String,
}

/// An immutable, fully-composed view of dashboard data at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    pub statistics: DashboardStats,
    pub active_sources: Vec<SourceInfo>,
    /// Newest first, at most [`RECENT_LIMIT`](crate::consts::cli_consts::refresh::RECENT_LIMIT).
    pub recent_transactions: Vec<Transaction>,
    /// Newest first, at most [`RECENT_LIMIT`](crate::consts::cli_consts::refresh::RECENT_LIMIT).
    pub recent_events: Vec<EventRecord>,
}

impl ViewSnapshot {
    /// The zeroed snapshot held before the first successful cycle completes.
    pub fn empty() -> Self {
        Self::default()
    }
}
