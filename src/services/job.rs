//! The job capability interface

use crate::errors::SchedulingResult;
use crate::models::{JobConfiguration, JobType};
use crate::scheduling::SchedulingManager;
use crate::services::Notifier;
use anyhow::Result;
use async_trait::async_trait;

/// A named unit of background work with a declared job type
///
/// Concrete implementations (analytics table build, data sync, tracker
/// notification dispatch, ...) live in the platform's subsystems and are
/// handed to the [`JobRegistry`] at startup. The engine only ever talks to
/// this interface.
///
/// Errors returned from [`execute`] are terminal for that single run: the
/// engine logs them, reports them through the notifier and updates the
/// persisted last-executed status, but never retries and never lets them
/// reach the trigger machinery.
///
/// [`JobRegistry`]: crate::scheduling::JobRegistry
/// [`execute`]: Job::execute
#[async_trait]
pub trait Job: Send + Sync {
    /// The job type this implementation handles
    fn job_type(&self) -> JobType;

    /// Run one execution for the given configuration
    ///
    /// The manager is passed in so jobs can submit follow-up work (e.g. a
    /// sync job scheduling an analytics rebuild); the notifier is for
    /// user-facing progress and failure messages.
    async fn execute(
        &self,
        config: &JobConfiguration,
        manager: &SchedulingManager,
        notifier: &dyn Notifier,
    ) -> Result<()>;

    /// Validate that this job can run in the current environment
    ///
    /// Checked before a configuration is scheduled; a failing validation
    /// skips the scheduling attempt with a warning.
    fn validate(&self) -> SchedulingResult<()> {
        Ok(())
    }
}
