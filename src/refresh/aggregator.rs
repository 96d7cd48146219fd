//! Refresh Cycle Aggregation
//!
//! One cycle fans out the four dashboard reads concurrently, waits for every
//! one of them to settle, and composes a [`ViewSnapshot`] only if all four
//! succeeded. Any failure drops the partial results wholesale, so a viewer
//! never sees fresh statistics paired with stale listings.

use crate::backend::DataService;
use crate::backend::error::DataServiceError;
use crate::consts::cli_consts::refresh::RECENT_LIMIT;
use crate::snapshot::{DashboardStats, EventRecord, SourceInfo, Transaction, ViewSnapshot};

/// Outcome of one refresh cycle. Transient; never persisted.
pub type RefreshCycleResult = Result<ViewSnapshot, DataServiceError>;

/// Runs refresh cycles against a data service.
pub struct Aggregator {
    service: Box<dyn DataService>,
}

impl Aggregator {
    pub fn new(service: Box<dyn DataService>) -> Self {
        Self { service }
    }

    /// Runs one full cycle.
    ///
    /// Waits for all four reads even when one fails early, then reports the
    /// first error in composition order (statistics, sources, transactions,
    /// events). Applying a successful snapshot is the caller's decision; this
    /// never touches the store and never retries.
    pub async fn run_cycle(&self) -> RefreshCycleResult {
        let (statistics, sources, transactions, events) = tokio::join!(
            self.service.get_statistics(),
            self.service.list_active_sources(),
            self.service.list_recent_transactions(RECENT_LIMIT),
            self.service.list_recent_events(RECENT_LIMIT),
        );

        Ok(compose(statistics?, sources?, transactions?, events?))
    }
}

/// Builds the snapshot, re-asserting the listing bound and ordering locally
/// so a misbehaving backend cannot produce an oversized or shuffled view.
fn compose(
    statistics: DashboardStats,
    active_sources: Vec<SourceInfo>,
    mut recent_transactions: Vec<Transaction>,
    mut recent_events: Vec<EventRecord>,
) -> ViewSnapshot {
    recent_transactions.sort_by(|a, b| b.date.cmp(&a.date));
    recent_transactions.truncate(RECENT_LIMIT);

    recent_events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent_events.truncate(RECENT_LIMIT);

    ViewSnapshot {
        statistics,
        active_sources,
        recent_transactions,
        recent_events,
    }
}
