use crate::backend::error::DataServiceError;
use crate::snapshot::{DashboardStats, EventRecord, SourceInfo, Transaction};

pub(crate) mod client;
pub use client::BackendClient;
pub mod error;

#[cfg(test)]
use mockall::{automock, predicate::*};

/// Read boundary to the commerce hub, plus the one sync trigger.
///
/// The four read operations are what a refresh cycle fans out over; each may
/// fail independently with a [`DataServiceError`].
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait DataService: Send + Sync {
    /// Fetch the aggregate dashboard counters.
    async fn get_statistics(&self) -> Result<DashboardStats, DataServiceError>;

    /// List the sources that are currently active (archived ones excluded).
    async fn list_active_sources(&self) -> Result<Vec<SourceInfo>, DataServiceError>;

    /// List the most recent transactions, newest first, at most `limit`.
    async fn list_recent_transactions(
        &self,
        limit: usize,
    ) -> Result<Vec<Transaction>, DataServiceError>;

    /// List the most recent backend events, newest first, at most `limit`.
    async fn list_recent_events(&self, limit: usize)
    -> Result<Vec<EventRecord>, DataServiceError>;

    /// Ask the backend to queue a full import for one source.
    async fn trigger_sync(&self, source_id: &str) -> Result<(), DataServiceError>;
}
