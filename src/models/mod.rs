//! Core data model for schedulable jobs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of background work a job configuration refers to
///
/// Every `Job` implementation declares exactly one of these; the registry
/// resolves a configuration to its implementation through this tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    /// Analytics table generation
    AnalyticsTable,
    /// Aggregate data synchronization with remote instances
    DataSync,
    /// Metadata synchronization with remote instances
    MetadataSync,
    /// Tracker program notification dispatch
    TrackerNotification,
    /// Orphaned file resource cleanup
    FileResourceCleanup,
    /// User credentials expiry alerting
    CredentialsExpiryAlert,
    /// Validation rule monitoring
    Monitoring,
    /// Outbound SMS delivery
    SmsSend,
}

/// Scheduling status of a job configuration
///
/// `Scheduled`, `Running`, `Completed` and `Stopped` are derived from the
/// in-memory handle state; `Disabled` only ever appears on the persisted
/// configuration after a run finds it disabled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Scheduled,
    Running,
    Completed,
    Stopped,
    Disabled,
}

/// Outcome of the most recent completed run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LastExecutedStatus {
    #[default]
    NotStarted,
    Success,
    Failed,
    Stopped,
}

/// Persisted description of one schedulable job instance
///
/// Created and edited through the platform's admin surface; the scheduling
/// engine reads it, mutates its status bookkeeping around each run, and writes
/// it back through the [`JobConfigurationService`] collaborator.
///
/// [`JobConfigurationService`]: crate::services::JobConfigurationService
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfiguration {
    /// Stable unique identifier
    pub uid: String,
    /// Human-readable name
    pub name: String,
    /// Which job implementation to run
    pub job_type: JobType,
    /// Cron expression for recurring schedules (six/seven field, seconds included)
    pub cron_expression: Option<String>,
    /// Disabled configurations are demoted after their in-flight run finishes
    pub enabled: bool,
    /// Continuous jobs are exempt from the one-run-per-type exclusion rule
    pub continuous_execution: bool,
    /// Current scheduling status as last persisted
    pub job_status: JobStatus,
    /// Outcome of the most recent run
    pub last_executed_status: LastExecutedStatus,
    /// When the most recent run finished
    pub last_executed: Option<DateTime<Utc>>,
}

impl JobConfiguration {
    pub fn new(uid: impl Into<String>, name: impl Into<String>, job_type: JobType) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            job_type,
            cron_expression: None,
            enabled: true,
            continuous_execution: false,
            job_status: JobStatus::Scheduled,
            last_executed_status: LastExecutedStatus::NotStarted,
            last_executed: None,
        }
    }

    pub fn with_cron(mut self, expression: impl Into<String>) -> Self {
        self.cron_expression = Some(expression.into());
        self
    }

    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous_execution = continuous;
        self
    }

    /// Whether this configuration carries a usable uid
    pub fn has_uid(&self) -> bool {
        !self.uid.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_display_roundtrip() {
        use std::str::FromStr;

        assert_eq!(JobType::AnalyticsTable.to_string(), "ANALYTICS_TABLE");
        assert_eq!(JobType::DataSync.to_string(), "DATA_SYNC");
        assert_eq!(
            JobType::from_str("TRACKER_NOTIFICATION").unwrap(),
            JobType::TrackerNotification
        );
    }

    #[test]
    fn test_configuration_builder_defaults() {
        let config = JobConfiguration::new("u1", "nightly analytics", JobType::AnalyticsTable)
            .with_cron("0 0 2 * * *");

        assert!(config.enabled);
        assert!(!config.continuous_execution);
        assert_eq!(config.job_status, JobStatus::Scheduled);
        assert_eq!(config.last_executed_status, LastExecutedStatus::NotStarted);
        assert_eq!(config.cron_expression.as_deref(), Some("0 0 2 * * *"));
    }

    #[test]
    fn test_has_uid_rejects_blank() {
        let config = JobConfiguration::new("  ", "blank", JobType::DataSync);
        assert!(!config.has_uid());

        let config = JobConfiguration::new("abc123", "ok", JobType::DataSync);
        assert!(config.has_uid());
    }
}
