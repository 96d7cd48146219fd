pub mod cli_consts {
    //! Client Configuration Constants
    //!
    //! This module contains all configuration constants for the dashboard
    //! client, organized by functional area for clarity and maintainability.

    // =============================================================================
    // QUEUE CONFIGURATION
    // =============================================================================

    /// Maximum number of event buffer size for worker threads
    pub const EVENT_QUEUE_SIZE: usize = 100;

    // =============================================================================
    // REFRESH CONFIGURATION
    // =============================================================================

    /// Refresh loop configuration
    pub mod refresh {
        use std::time::Duration;

        /// Interval between refresh cycles (seconds)
        pub const INTERVAL_SECS: u64 = 30;

        /// Upper bound on items kept in the recent-transactions and
        /// recent-events listings
        pub const RECENT_LIMIT: usize = 10;

        /// Helper function to get the default refresh interval
        pub const fn interval() -> Duration {
            Duration::from_secs(INTERVAL_SECS)
        }
    }

    /// Failed-cycle backoff configuration
    pub mod refresh_backoff {
        use std::time::Duration;

        /// Initial delay added after the first failed cycle (milliseconds)
        pub const INITIAL_BACKOFF_MS: u64 = 10_000;

        /// Ceiling for the doubling backoff delay (milliseconds)
        pub const MAX_BACKOFF_MS: u64 = 300_000; // 5 minutes

        /// Helper function to get initial backoff duration
        pub const fn initial_backoff() -> Duration {
            Duration::from_millis(INITIAL_BACKOFF_MS)
        }

        /// Helper function to get the backoff ceiling
        pub const fn max_backoff() -> Duration {
            Duration::from_millis(MAX_BACKOFF_MS)
        }
    }

    /// Update-check configuration
    pub mod update_check {
        use std::time::Duration;

        /// Interval between checks against the latest published release (seconds)
        pub const INTERVAL_SECS: u64 = 6 * 60 * 60; // 6 hours

        /// Helper function to get the update-check interval
        pub const fn interval() -> Duration {
            Duration::from_secs(INTERVAL_SECS)
        }
    }
}
