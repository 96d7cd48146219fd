//! Headless mode execution

use super::{
    SessionData,
    messages::{print_session_exit_success, print_session_shutdown, print_session_starting},
};
use crate::events::{Event, EventType, Worker};
use std::error::Error;

/// Runs the dashboard in headless mode
///
/// This function handles:
/// 1. Console event logging
/// 2. Ctrl+C shutdown handling
/// 3. Stopping after `--max-cycles` completed refresh cycles
///
/// # Arguments
/// * `session` - Session data from setup
///
/// # Returns
/// * `Ok(())` - Headless mode completed successfully
/// * `Err` - Headless mode failed
pub async fn run_headless_mode(mut session: SessionData) -> Result<(), Box<dyn Error>> {
    print_session_starting(&session.base_url, session.refresh_interval.as_secs());

    // Trigger shutdown on Ctrl+C
    let shutdown_sender_clone = session.shutdown_sender.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_sender_clone.send(());
        }
    });

    let mut shutdown_receiver = session.shutdown_sender.subscribe();
    let mut completed_cycles: u32 = 0;

    // Event loop: log events to console until shutdown
    loop {
        tokio::select! {
            Some(event) = session.event_receiver.recv() => {
                if event.should_display() {
                    println!("{}", event);
                }
                if is_cycle_outcome(&event) {
                    completed_cycles += 1;
                    if session.max_cycles.is_some_and(|max| completed_cycles >= max) {
                        let _ = session.shutdown_sender.send(());
                        break;
                    }
                }
            }
            _ = shutdown_receiver.recv() => {
                break;
            }
        }
    }

    // Wait for workers to finish
    print_session_shutdown();
    for handle in session.join_handles {
        let _ = handle.await;
    }
    print_session_exit_success();

    Ok(())
}

/// A refresh cycle ran to completion, successfully or not.
///
/// Refresh progress events (state changes, hold-off notices) do not count;
/// only the one success or error outcome each cycle ends with.
fn is_cycle_outcome(event: &Event) -> bool {
    matches!(event.worker, Worker::Refresher)
        && matches!(event.event_type, EventType::Success | EventType::Error)
}
