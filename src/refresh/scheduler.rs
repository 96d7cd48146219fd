//! Refresh Scheduling
//!
//! Drives the aggregator: one cycle immediately on start, then one per timer
//! tick. The cycle is awaited inside the tick arm, so at most one cycle is
//! ever in flight; ticks that fire while a cycle is still running are
//! skipped rather than queued. `stop()` cancels the timer and any result
//! still in flight is discarded, never applied.

use crate::consts::cli_consts::{refresh, refresh_backoff};
use crate::error_classifier::{ErrorClassifier, LogLevel};
use crate::events::{Event, EventSender, EventType, RefreshState};
use crate::refresh::Aggregator;
use crate::snapshot_store::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("scheduler was stopped; create a new instance to restart")]
    Stopped,
}

/// Lifecycle of a scheduler instance. `Stopped` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Doubling hold-off between cycle attempts after failures.
///
/// The hold-off is a gate, not a sleep: ticks that arrive before it elapses
/// are skipped, so stopping is never delayed by a backed-off loop.
struct FailureBackoff {
    last_attempt: std::time::Instant,
    hold_off: Duration,
}

impl FailureBackoff {
    fn new() -> Self {
        Self {
            last_attempt: std::time::Instant::now(),
            hold_off: Duration::ZERO,
        }
    }

    /// Check if enough time has passed since the last attempt.
    fn allows_cycle_now(&self) -> bool {
        self.hold_off.is_zero() || self.last_attempt.elapsed() >= self.hold_off
    }

    fn hold_off(&self) -> Duration {
        self.hold_off
    }

    /// Record that a cycle attempt was made (updates timing).
    fn record_attempt(&mut self) {
        self.last_attempt = std::time::Instant::now();
    }

    /// Clear the hold-off after a successful cycle.
    fn record_success(&mut self) {
        self.hold_off = Duration::ZERO;
    }

    /// Double the hold-off after a failed cycle, up to the ceiling.
    fn record_failure(&mut self) {
        self.hold_off = if self.hold_off.is_zero() {
            refresh_backoff::initial_backoff()
        } else {
            std::cmp::min(self.hold_off * 2, refresh_backoff::max_backoff())
        };
    }
}

/// Periodic driver for refresh cycles.
///
/// `Idle` until `start()`, then `Running` until `stop()`. A stopped scheduler
/// stays stopped; build a new one to resume refreshing.
pub struct RefreshScheduler {
    aggregator: Arc<Aggregator>,
    store: SnapshotStore,
    events: EventSender,
    tick_interval: Duration,
    state: SchedulerState,
    shutdown_sender: Option<broadcast::Sender<()>>,
    loop_handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new(aggregator: Aggregator, store: SnapshotStore, events: EventSender) -> Self {
        Self::with_interval(aggregator, store, events, refresh::interval())
    }

    /// Builds a scheduler with a custom tick interval.
    pub fn with_interval(
        aggregator: Aggregator,
        store: SnapshotStore,
        events: EventSender,
        tick_interval: Duration,
    ) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            store,
            events,
            tick_interval,
            state: SchedulerState::Idle,
            shutdown_sender: None,
            loop_handle: None,
        }
    }

    /// Starts the refresh loop: one cycle immediately, then one per tick.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Running => return Err(SchedulerError::AlreadyRunning),
            SchedulerState::Stopped => return Err(SchedulerError::Stopped),
            SchedulerState::Idle => {}
        }

        let (shutdown_sender, shutdown_receiver) = broadcast::channel(1);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.aggregator),
            self.store.clone(),
            self.events.clone(),
            self.tick_interval,
            shutdown_receiver,
        ));

        self.shutdown_sender = Some(shutdown_sender);
        self.loop_handle = Some(handle);
        self.state = SchedulerState::Running;
        Ok(())
    }

    /// Stops the refresh loop. Idempotent.
    ///
    /// No tick is accepted after this returns. A cycle already in flight may
    /// run to completion, but its result is discarded rather than applied.
    pub fn stop(&mut self) {
        if let Some(sender) = self.shutdown_sender.take() {
            let _ = sender.send(());
        }
        self.state = SchedulerState::Stopped;
    }

    /// Waits for the loop task to wind down after `stop()`.
    pub async fn join(&mut self) {
        if let Some(handle) = self.loop_handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }
}

async fn run_loop(
    aggregator: Arc<Aggregator>,
    store: SnapshotStore,
    events: EventSender,
    tick_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    // Second receiver for the post-cycle teardown check; subscribing here,
    // before any cycle runs, guarantees it observes a stop signal sent while
    // a cycle is in flight.
    let mut teardown_check = shutdown.resubscribe();

    let mut backoff = FailureBackoff::new();
    let classifier = ErrorClassifier::new();

    // The first tick of a tokio interval completes immediately, which gives
    // the on-start cycle before the periodic cadence begins.
    let mut timer = tokio::time::interval(tick_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => break,
            _ = timer.tick() => {
                if !backoff.allows_cycle_now() {
                    events
                        .send_refresh_event(
                            format!(
                                "Holding off after failed refresh - retrying within {}s",
                                backoff.hold_off().as_secs()
                            ),
                            EventType::Waiting,
                            LogLevel::Debug,
                        )
                        .await;
                    continue;
                }

                backoff.record_attempt();
                events
                    .send_event(Event::state_change(
                        RefreshState::Refreshing,
                        "Refreshing dashboard...".to_string(),
                    ))
                    .await;

                let result = aggregator.run_cycle().await;

                // stop() may have landed while the cycle was in flight; its
                // result must not touch the store after teardown.
                if !matches!(teardown_check.try_recv(), Err(TryRecvError::Empty)) {
                    break;
                }

                match result {
                    Ok(snapshot) => {
                        backoff.record_success();
                        let summary = format!(
                            "Dashboard refreshed: {} orders total, {} active sources",
                            snapshot.statistics.total_orders,
                            snapshot.active_sources.len()
                        );
                        store.replace(snapshot).await;
                        log::info!("{}", summary);
                        events
                            .send_refresh_event(summary, EventType::Success, LogLevel::Info)
                            .await;
                    }
                    Err(e) => {
                        backoff.record_failure();
                        let log_level = classifier.classify_fetch_error(&e);
                        let message = format!(
                            "Refresh cycle failed: {} - keeping last good snapshot, retrying within {}s",
                            e,
                            backoff.hold_off().as_secs()
                        );
                        let filter: log::LevelFilter = log_level.into();
                        if let Some(level) = filter.to_level() {
                            log::log!(level, "{}", message);
                        }
                        events
                            .send_refresh_event(message, EventType::Error, log_level)
                            .await;
                    }
                }

                events
                    .send_event(Event::state_change(
                        RefreshState::Waiting,
                        "Waiting for next refresh".to_string(),
                    ))
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DataService;
    use crate::backend::error::DataServiceError;
    use crate::events::Worker;
    use crate::snapshot::{DashboardStats, EventRecord, SourceInfo, Transaction};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{Semaphore, mpsc};
    use tokio::time::sleep;

    fn channel_events() -> (EventSender, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(100);
        (EventSender::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    /// Succeeds every read and counts how many cycles have started.
    struct CountingService {
        cycles_started: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl DataService for CountingService {
        async fn get_statistics(&self) -> Result<DashboardStats, DataServiceError> {
            self.cycles_started.fetch_add(1, Ordering::SeqCst);
            Ok(DashboardStats {
                total_orders: 42,
                ..Default::default()
            })
        }

        async fn list_active_sources(&self) -> Result<Vec<SourceInfo>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn list_recent_transactions(
            &self,
            _limit: usize,
        ) -> Result<Vec<Transaction>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn list_recent_events(
            &self,
            _limit: usize,
        ) -> Result<Vec<EventRecord>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn trigger_sync(&self, _source_id: &str) -> Result<(), DataServiceError> {
            Ok(())
        }
    }

    /// Fails every cycle at the statistics read.
    struct FailingService;

    #[async_trait::async_trait]
    impl DataService for FailingService {
        async fn get_statistics(&self) -> Result<DashboardStats, DataServiceError> {
            Err(DataServiceError::Http {
                status: 500,
                message: "backend down".to_string(),
            })
        }

        async fn list_active_sources(&self) -> Result<Vec<SourceInfo>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn list_recent_transactions(
            &self,
            _limit: usize,
        ) -> Result<Vec<Transaction>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn list_recent_events(
            &self,
            _limit: usize,
        ) -> Result<Vec<EventRecord>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn trigger_sync(&self, _source_id: &str) -> Result<(), DataServiceError> {
            Ok(())
        }
    }

    /// Every read holds for a while and tracks how many reads run at once.
    /// One cycle fans out to four concurrent reads; an overlapping second
    /// cycle would push the high-water mark above four.
    struct SlowService {
        concurrent_reads: Arc<AtomicUsize>,
        max_concurrent_reads: Arc<AtomicUsize>,
        cycles_started: Arc<AtomicUsize>,
    }

    impl SlowService {
        async fn tracked_read(&self) {
            let now = self.concurrent_reads.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent_reads.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(50)).await;
            self.concurrent_reads.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl DataService for SlowService {
        async fn get_statistics(&self) -> Result<DashboardStats, DataServiceError> {
            self.cycles_started.fetch_add(1, Ordering::SeqCst);
            self.tracked_read().await;
            Ok(DashboardStats::default())
        }

        async fn list_active_sources(&self) -> Result<Vec<SourceInfo>, DataServiceError> {
            self.tracked_read().await;
            Ok(Vec::new())
        }

        async fn list_recent_transactions(
            &self,
            _limit: usize,
        ) -> Result<Vec<Transaction>, DataServiceError> {
            self.tracked_read().await;
            Ok(Vec::new())
        }

        async fn list_recent_events(
            &self,
            _limit: usize,
        ) -> Result<Vec<EventRecord>, DataServiceError> {
            self.tracked_read().await;
            Ok(Vec::new())
        }

        async fn trigger_sync(&self, _source_id: &str) -> Result<(), DataServiceError> {
            Ok(())
        }
    }

    /// Parks the statistics read on a semaphore until the test releases it,
    /// then succeeds. Lets a test stop the scheduler mid-cycle.
    struct GatedService {
        gate: Arc<Semaphore>,
    }

    #[async_trait::async_trait]
    impl DataService for GatedService {
        async fn get_statistics(&self) -> Result<DashboardStats, DataServiceError> {
            let _permit = self.gate.acquire().await.unwrap();
            Ok(DashboardStats {
                total_orders: 99,
                ..Default::default()
            })
        }

        async fn list_active_sources(&self) -> Result<Vec<SourceInfo>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn list_recent_transactions(
            &self,
            _limit: usize,
        ) -> Result<Vec<Transaction>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn list_recent_events(
            &self,
            _limit: usize,
        ) -> Result<Vec<EventRecord>, DataServiceError> {
            Ok(Vec::new())
        }

        async fn trigger_sync(&self, _source_id: &str) -> Result<(), DataServiceError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn first_cycle_runs_immediately_on_start() {
        let cycles = Arc::new(AtomicUsize::new(0));
        let service = CountingService {
            cycles_started: Arc::clone(&cycles),
        };
        let store = SnapshotStore::new();
        let (events, mut event_rx) = channel_events();

        let mut scheduler = RefreshScheduler::with_interval(
            Aggregator::new(Box::new(service)),
            store.clone(),
            events,
            Duration::from_secs(60),
        );
        scheduler.start().unwrap();
        sleep(Duration::from_millis(100)).await;
        scheduler.stop();
        scheduler.join().await;

        assert_eq!(cycles.load(Ordering::SeqCst), 1);
        assert_eq!(store.applied_cycles().await, 1);
        assert_eq!(store.get().await.statistics.total_orders, 42);

        let events = drain(&mut event_rx);
        assert!(
            events
                .iter()
                .any(|e| e.worker == Worker::Refresher && e.event_type == EventType::Success),
            "expected a success event from the refresher"
        );
    }

    #[tokio::test]
    async fn failed_cycles_leave_the_store_untouched() {
        let store = SnapshotStore::new();
        let (events, mut event_rx) = channel_events();

        let mut scheduler = RefreshScheduler::with_interval(
            Aggregator::new(Box::new(FailingService)),
            store.clone(),
            events,
            Duration::from_millis(20),
        );
        scheduler.start().unwrap();
        sleep(Duration::from_millis(120)).await;

        assert!(scheduler.is_running(), "failures must not kill the loop");
        scheduler.stop();
        scheduler.join().await;

        assert!(store.is_loading().await);
        assert_eq!(store.applied_cycles().await, 0);

        let events = drain(&mut event_rx);
        assert!(
            events
                .iter()
                .any(|e| e.event_type == EventType::Error && e.msg.contains("backend down")),
            "expected a failure event carrying the backend error"
        );
        // Ticks after the failure are held off rather than the loop dying.
        assert!(
            events
                .iter()
                .any(|e| e.event_type == EventType::Waiting && e.msg.contains("Holding off")),
            "expected the loop to keep ticking after the failure"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn slow_cycles_never_overlap() {
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_concurrent = Arc::new(AtomicUsize::new(0));
        let cycles = Arc::new(AtomicUsize::new(0));
        let service = SlowService {
            concurrent_reads: Arc::clone(&concurrent),
            max_concurrent_reads: Arc::clone(&max_concurrent),
            cycles_started: Arc::clone(&cycles),
        };
        let store = SnapshotStore::new();
        let (events, _event_rx) = channel_events();

        // Ticks fire five times faster than a cycle takes to finish.
        let mut scheduler = RefreshScheduler::with_interval(
            Aggregator::new(Box::new(service)),
            store,
            events,
            Duration::from_millis(10),
        );
        scheduler.start().unwrap();
        sleep(Duration::from_millis(300)).await;
        scheduler.stop();
        scheduler.join().await;

        assert!(
            cycles.load(Ordering::SeqCst) >= 2,
            "expected several cycles to have run"
        );
        assert!(
            max_concurrent.load(Ordering::SeqCst) <= 4,
            "more than four concurrent reads means two cycles overlapped"
        );
    }

    #[tokio::test]
    async fn stop_during_in_flight_cycle_discards_its_result() {
        let gate = Arc::new(Semaphore::new(0));
        let service = GatedService {
            gate: Arc::clone(&gate),
        };
        let store = SnapshotStore::new();
        let (events, _event_rx) = channel_events();

        let mut scheduler = RefreshScheduler::with_interval(
            Aggregator::new(Box::new(service)),
            store.clone(),
            events,
            Duration::from_secs(60),
        );
        scheduler.start().unwrap();

        // Let the immediate cycle reach the gate, stop mid-flight, then let
        // the cycle finish successfully.
        sleep(Duration::from_millis(50)).await;
        scheduler.stop();
        gate.add_permits(1);
        scheduler.join().await;

        assert!(
            store.is_loading().await,
            "a result resolving after stop() must not be applied"
        );
        assert_eq!(store.applied_cycles().await, 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_safe_before_start() {
        let store = SnapshotStore::new();
        let (events, _event_rx) = channel_events();

        let mut never_started = RefreshScheduler::with_interval(
            Aggregator::new(Box::new(FailingService)),
            store.clone(),
            events.clone(),
            Duration::from_millis(20),
        );
        never_started.stop();
        never_started.stop();

        let mut scheduler = RefreshScheduler::with_interval(
            Aggregator::new(Box::new(FailingService)),
            store,
            events,
            Duration::from_millis(20),
        );
        scheduler.start().unwrap();
        scheduler.stop();
        scheduler.stop();
        scheduler.join().await;
        scheduler.join().await;
    }

    #[tokio::test]
    async fn stopped_scheduler_rejects_restart() {
        let store = SnapshotStore::new();
        let (events, _event_rx) = channel_events();

        let mut scheduler = RefreshScheduler::with_interval(
            Aggregator::new(Box::new(FailingService)),
            store,
            events,
            Duration::from_millis(20),
        );
        scheduler.start().unwrap();
        assert_eq!(scheduler.start(), Err(SchedulerError::AlreadyRunning));
        scheduler.stop();
        scheduler.join().await;
        assert_eq!(scheduler.start(), Err(SchedulerError::Stopped));
        assert!(!scheduler.is_running());
    }

    #[test]
    fn backoff_doubles_up_to_the_ceiling_and_resets_on_success() {
        let mut backoff = FailureBackoff::new();
        assert!(backoff.allows_cycle_now());
        assert_eq!(backoff.hold_off(), Duration::ZERO);

        backoff.record_attempt();
        backoff.record_failure();
        assert_eq!(backoff.hold_off(), refresh_backoff::initial_backoff());
        assert!(!backoff.allows_cycle_now());

        backoff.record_failure();
        assert_eq!(backoff.hold_off(), refresh_backoff::initial_backoff() * 2);

        for _ in 0..12 {
            backoff.record_failure();
        }
        assert_eq!(backoff.hold_off(), refresh_backoff::max_backoff());

        backoff.record_success();
        assert_eq!(backoff.hold_off(), Duration::ZERO);
        assert!(backoff.allows_cycle_now());
    }
}
