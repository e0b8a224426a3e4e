//! Job scheduling and execution engine
//!
//! The engine is assembled from small, separately testable parts:
//!
//! - [`JobRegistry`]: startup-time lookup table from job type to implementation
//! - [`TriggerScheduler`]: turns cron/one-shot/fixed-cadence triggers into fires
//! - [`ExecutorPool`]: bounded asynchronous execution on the tokio runtime
//! - [`RunningJobSet`]: type-level duplicate-run tracking for in-flight runs
//! - [`SchedulingManager`]: the orchestration root tying the above together
//!
//! Application code talks to [`SchedulingManager`] only; the other types are
//! exported for wiring and tests.

pub mod executor;
pub mod handle;
pub mod manager;
pub mod registry;
pub mod running;
pub mod trigger;

pub use executor::ExecutorPool;
pub use handle::{ScheduledHandle, TaskResultHandle};
pub use manager::{SchedulerStats, SchedulingManager};
pub use registry::JobRegistry;
pub use running::RunningJobSet;
pub use trigger::TriggerScheduler;
