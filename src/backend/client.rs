//! Commerce Hub Client
//!
//! A client for the commerce hub's dashboard API, covering the aggregate read
//! endpoints and the per-source sync trigger.

use crate::backend::DataService;
use crate::backend::error::DataServiceError;
use crate::snapshot::{DashboardStats, EventRecord, SourceInfo, Transaction};
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

// User-Agent string with CLI version
const USER_AGENT: &str = concat!("storewatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Builds a client against an explicit base URL (flag or config override).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: ClientBuilder::new()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn sync_endpoint(source_id: &str) -> String {
        format!("api/sources/{}/sync", urlencoding::encode(source_id))
    }

    fn decode_response<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DataServiceError> {
        serde_json::from_slice(bytes).map_err(DataServiceError::Decode)
    }

    async fn handle_response_status(response: Response) -> Result<Response, DataServiceError> {
        if !response.status().is_success() {
            return Err(DataServiceError::from_response(response).await);
        }
        Ok(response)
    }

    async fn get_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, DataServiceError> {
        let url = self.build_url(endpoint);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = Self::handle_response_status(response).await?;
        let response_bytes = response.bytes().await?;
        Self::decode_response(&response_bytes)
    }

    async fn post_request_no_response(&self, endpoint: &str) -> Result<(), DataServiceError> {
        let url = self.build_url(endpoint);
        let response = self
            .client
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::handle_response_status(response).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DataService for BackendClient {
    /// Fetch the aggregate dashboard counters.
    async fn get_statistics(&self) -> Result<DashboardStats, DataServiceError> {
        self.get_request("api/dashboard/statistics").await
    }

    /// List the sources that are currently active.
    async fn list_active_sources(&self) -> Result<Vec<SourceInfo>, DataServiceError> {
        self.get_request("api/sources?active=true").await
    }

    /// List the most recent transactions, newest first.
    async fn list_recent_transactions(
        &self,
        limit: usize,
    ) -> Result<Vec<Transaction>, DataServiceError> {
        let endpoint = format!("api/transactions?limit={}&order=date_desc", limit);
        self.get_request(&endpoint).await
    }

    /// List the most recent backend events, newest first.
    async fn list_recent_events(
        &self,
        limit: usize,
    ) -> Result<Vec<EventRecord>, DataServiceError> {
        let endpoint = format!("api/events?limit={}&order=created_desc", limit);
        self.get_request(&endpoint).await
    }

    /// Ask the backend to queue a full import for one source.
    async fn trigger_sync(&self, source_id: &str) -> Result<(), DataServiceError> {
        self.post_request_no_response(&Self::sync_endpoint(source_id))
            .await
    }
}
