//! Periodic dashboard refresh: cycle aggregation and scheduling.

pub mod aggregator;
pub mod scheduler;

pub use aggregator::{Aggregator, RefreshCycleResult};
pub use scheduler::RefreshScheduler;
