//! Session setup and initialization

use crate::backend::BackendClient;
use crate::events::Event;
use crate::runtime::start_runtime;
use crate::snapshot_store::SnapshotStore;
use std::error::Error;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Session data for a running dashboard
#[derive(Debug)]
pub struct SessionData {
    /// Event receiver for worker events
    pub event_receiver: mpsc::Receiver<Event>,
    /// Join handles for worker tasks
    pub join_handles: Vec<JoinHandle<()>>,
    /// Shutdown sender to stop all workers
    pub shutdown_sender: broadcast::Sender<()>,
    /// Backend base URL the session is watching (for display purposes)
    pub base_url: String,
    /// Resolved refresh interval (for display purposes)
    pub refresh_interval: Duration,
    /// Stop after this many completed refresh cycles
    pub max_cycles: Option<u32>,
}

/// Sets up a dashboard session.
///
/// This function handles the common setup for running the dashboard:
/// 1. Builds the backend client for the resolved base URL
/// 2. Creates the snapshot store and shutdown channel
/// 3. Starts the background workers
/// 4. Returns session data for mode-specific handling
///
/// # Arguments
/// * `base_url` - Resolved backend base URL
/// * `refresh_interval` - Resolved interval between refresh cycles
/// * `max_cycles` - Optional limit on completed refresh cycles
///
/// # Returns
/// * `Ok(SessionData)` - Successfully set up session
/// * `Err` - Session setup failed
pub async fn setup_session(
    base_url: String,
    refresh_interval: Duration,
    max_cycles: Option<u32>,
) -> Result<SessionData, Box<dyn Error>> {
    // A zero interval cannot drive a timer.
    if refresh_interval.is_zero() {
        return Err(Box::from("Refresh interval must be at least one second"));
    }

    let client = BackendClient::with_base_url(base_url.clone());
    let store = SnapshotStore::new();

    // Create shutdown channel - only one shutdown signal needed
    let (shutdown_sender, _) = broadcast::channel(1);

    let (event_receiver, join_handles) = start_runtime(
        client,
        store,
        refresh_interval,
        shutdown_sender.subscribe(),
    );

    Ok(SessionData {
        event_receiver,
        join_handles,
        shutdown_sender,
        base_url,
        refresh_interval,
        max_cycles,
    })
}
