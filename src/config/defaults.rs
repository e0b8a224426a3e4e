/// Configuration default values
///
/// Central location for all scheduler configuration defaults.
// Executor pool defaults
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 25;

// Shutdown defaults
pub const DEFAULT_SHUTDOWN_GRACE: &str = "30s";

// Drain-poll cadence while waiting for running jobs during shutdown
pub const DEFAULT_DRAIN_POLL_INTERVAL: &str = "500ms";

// Floor for the configured drain-poll cadence; tokio intervals reject zero
pub const MIN_DRAIN_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(10);
