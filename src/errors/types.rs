//! Error type definitions for the scheduling engine

use crate::models::JobType;
use thiserror::Error;

/// Top-level error type for the scheduling engine
///
/// Most scheduling operations follow a best-effort policy and skip invalid
/// input with a warning instead of surfacing these; they exist for the seams
/// where a caller genuinely needs to know why something was rejected
/// (validation hooks, store access).
#[derive(Error, Debug)]
pub enum SchedulingError {
    /// Cron expression could not be parsed
    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidCron { expression: String, message: String },

    /// Job configuration carries no usable uid
    #[error("Job configuration '{name}' is missing a uid")]
    MissingUid { name: String },

    /// No implementation registered for the requested job type
    #[error("No job registered for job type {job_type}")]
    JobNotRegistered { job_type: JobType },

    /// Job-supplied validation rejected the configuration
    #[error("Job validation failed: {message}")]
    Validation { message: String },

    /// Configuration store access failed
    #[error("Configuration store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl SchedulingError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid-cron error from the parser failure
    pub fn invalid_cron<E: std::fmt::Display>(expression: &str, source: E) -> Self {
        Self::InvalidCron {
            expression: expression.to_string(),
            message: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SchedulingError::invalid_cron("not a cron", "expected six fields");
        assert!(err.to_string().contains("not a cron"));

        let err = SchedulingError::MissingUid {
            name: "nightly".to_string(),
        };
        assert!(err.to_string().contains("nightly"));

        let err = SchedulingError::JobNotRegistered {
            job_type: JobType::AnalyticsTable,
        };
        assert!(err.to_string().contains("ANALYTICS_TABLE"));
    }
}
