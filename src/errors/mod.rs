//! Centralized error handling for the scheduling engine
//!
//! The engine deliberately keeps its error surface small: configuration
//! problems (blank uid, malformed cron, past-dated one-shot) are skipped with
//! a warning rather than raised, and job-body failures are captured at the
//! execution wrapper and never propagate past it. The types here cover the
//! remaining cases where an error is genuinely returned to a caller.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using SchedulingError
pub type SchedulingResult<T> = Result<T, SchedulingError>;
