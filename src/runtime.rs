//! Dashboard runtime.
//!
//! Wires the long-running workers together: the refresh scheduler that keeps
//! the snapshot store current, and the update checker that watches releases.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::backend::BackendClient;
use crate::consts::cli_consts::EVENT_QUEUE_SIZE;
use crate::events::{Event, EventSender};
use crate::refresh::{Aggregator, RefreshScheduler};
use crate::snapshot_store::SnapshotStore;
use crate::version_checker::start_update_checker_task;

/// Starts the background workers for a dashboard session.
///
/// Returns the receiver for worker events together with the join handles of
/// every spawned task. Sending on the shutdown channel stops the workers;
/// callers should await the handles afterwards to let them wind down.
pub fn start_runtime(
    client: BackendClient,
    store: SnapshotStore,
    refresh_interval: Duration,
    shutdown: broadcast::Receiver<()>,
) -> (mpsc::Receiver<Event>, Vec<JoinHandle<()>>) {
    let (event_sender, event_receiver) = mpsc::channel::<Event>(EVENT_QUEUE_SIZE);
    let mut join_handles = Vec::new();

    let update_checker_handle = start_update_checker_task(
        env!("CARGO_PKG_VERSION").to_string(),
        event_sender.clone(),
        shutdown.resubscribe(),
    );
    join_handles.push(update_checker_handle);

    let refresh_handle =
        spawn_refresh_worker(client, store, refresh_interval, event_sender, shutdown);
    join_handles.push(refresh_handle);

    (event_receiver, join_handles)
}

/// Supervises a [`RefreshScheduler`] for the lifetime of the session.
///
/// The scheduler owns its own loop task; this wrapper exists so that a
/// shutdown signal tears the loop down and is awaited before the handle
/// resolves.
fn spawn_refresh_worker(
    client: BackendClient,
    store: SnapshotStore,
    refresh_interval: Duration,
    event_sender: mpsc::Sender<Event>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let aggregator = Aggregator::new(Box::new(client));
        let events = EventSender::new(event_sender);
        let mut scheduler =
            RefreshScheduler::with_interval(aggregator, store, events, refresh_interval);
        if scheduler.start().is_err() {
            // Freshly built schedulers only refuse to start when the runtime
            // is already tearing down.
            return;
        }

        // recv() errors mean every sender is gone, which is also a shutdown.
        let _ = shutdown.recv().await;
        scheduler.stop();
        scheduler.join().await;
    })
}
