//! Scheduling manager: the orchestration root of the engine

use crate::config::SchedulerConfig;
use crate::errors::SchedulingError;
use crate::models::{JobConfiguration, JobStatus, LastExecutedStatus};
use crate::scheduling::executor::ExecutorPool;
use crate::scheduling::handle::{ScheduledHandle, TaskResultHandle};
use crate::scheduling::registry::JobRegistry;
use crate::scheduling::running::RunningJobSet;
use crate::scheduling::trigger::TriggerScheduler;
use crate::services::{JobConfigurationService, Notifier};
use chrono::{DateTime, Utc};
use cron::Schedule;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Counts of tracked state, for the platform's health surface
#[derive(Debug, Clone)]
pub struct SchedulerStats {
    /// Handles tracked for recurring/one-shot schedules
    pub scheduled_jobs: usize,
    /// Handles tracked for immediate executions
    pub current_tasks: usize,
    /// Configurations with a run currently in flight
    pub running_jobs: usize,
}

struct ManagerInner {
    registry: JobRegistry,
    trigger: TriggerScheduler,
    pool: ExecutorPool,
    running: RunningJobSet,
    store: Arc<dyn JobConfigurationService>,
    notifier: Arc<dyn Notifier>,
    /// Handles for cron/one-shot/fixed-cadence schedules, keyed by uid
    scheduled: RwLock<HashMap<String, ScheduledHandle>>,
    /// Handles for immediate out-of-band executions, keyed by uid
    current_tasks: RwLock<HashMap<String, ScheduledHandle>>,
    shutdown_grace: Duration,
    drain_poll: Duration,
}

/// Process-wide scheduling and execution manager
///
/// Owns all scheduler state explicitly: the job registry, the trigger
/// scheduler, the executor pool, the running set and the per-uid handle maps.
/// Constructed once at startup and cloned (cheaply) into every component that
/// needs to schedule work. All operations are callable from any thread.
///
/// Scheduling a uid that is already tracked supersedes the previous schedule:
/// the old handle is cancelled before the new one is installed, so at most one
/// handle per uid is ever tracked.
#[derive(Clone)]
pub struct SchedulingManager {
    inner: Arc<ManagerInner>,
}

impl SchedulingManager {
    pub fn new(
        registry: JobRegistry,
        store: Arc<dyn JobConfigurationService>,
        notifier: Arc<dyn Notifier>,
        config: &SchedulerConfig,
    ) -> Self {
        info!(
            registered_jobs = registry.len(),
            max_concurrent = config.max_concurrent_jobs,
            "Scheduling manager initialized"
        );
        Self {
            inner: Arc::new(ManagerInner {
                registry,
                trigger: TriggerScheduler::new(),
                pool: ExecutorPool::new(config.max_concurrent_jobs),
                running: RunningJobSet::new(),
                store,
                notifier,
                scheduled: RwLock::new(HashMap::new()),
                current_tasks: RwLock::new(HashMap::new()),
                shutdown_grace: config.shutdown_grace(),
                drain_poll: config.drain_poll_interval(),
            }),
        }
    }

    // ---- scheduling API -------------------------------------------------

    /// Schedule a recurring, cron-driven job
    ///
    /// Invalid input (blank uid, missing or malformed cron expression) is
    /// skipped with a warning; nothing is surfaced to the caller. An existing
    /// schedule for the same uid is cancelled first.
    pub async fn schedule_job(&self, config: &JobConfiguration) {
        if !self.precheck(config) {
            return;
        }
        let Some(expression) = config.cron_expression.as_deref() else {
            warn!(uid = %config.uid, "Job configuration has no cron expression, not scheduling");
            return;
        };
        let schedule = match Schedule::from_str(expression) {
            Ok(schedule) => schedule,
            Err(e) => {
                let err = SchedulingError::invalid_cron(expression, e);
                warn!(uid = %config.uid, "Not scheduling: {err}");
                return;
            }
        };

        self.stop_tracked_handle(&config.uid).await;

        let manager = self.clone();
        let job_config = config.clone();
        let handle = self.inner.trigger.schedule_cron(schedule, move || {
            let manager = manager.clone();
            let config = job_config.clone();
            async move {
                manager.run_guarded(config).await;
            }
        });
        self.inner
            .scheduled
            .write()
            .await
            .insert(config.uid.clone(), handle);
        info!(uid = %config.uid, job_type = %config.job_type, cron = expression, "Scheduled job");
    }

    /// Schedule a one-shot execution at a future instant
    ///
    /// A date that is not strictly in the future silently does nothing.
    pub async fn schedule_job_at(&self, date: DateTime<Utc>, config: &JobConfiguration) {
        if !self.precheck(config) {
            return;
        }
        if date <= Utc::now() {
            debug!(uid = %config.uid, %date, "One-shot schedule date is not in the future, ignoring");
            return;
        }

        self.stop_tracked_handle(&config.uid).await;

        let manager = self.clone();
        let job_config = config.clone();
        let handle = self.inner.trigger.schedule_at(date, move || async move {
            manager.run_guarded(job_config).await;
        });
        self.inner
            .scheduled
            .write()
            .await
            .insert(config.uid.clone(), handle);
        info!(uid = %config.uid, job_type = %config.job_type, %date, "Scheduled one-shot job");
    }

    /// Schedule each configuration in turn; no atomicity across the list
    pub async fn schedule_jobs(&self, configs: &[JobConfiguration]) {
        for config in configs {
            self.schedule_job(config).await;
        }
    }

    /// Schedule a recurring job with a delay measured from each completion
    pub async fn schedule_job_with_fixed_delay(
        &self,
        config: &JobConfiguration,
        first_run: DateTime<Utc>,
        interval_secs: u64,
    ) {
        if !self.precheck(config) {
            return;
        }
        self.stop_tracked_handle(&config.uid).await;

        let manager = self.clone();
        let job_config = config.clone();
        let handle = self.inner.trigger.schedule_fixed_delay(
            first_run,
            Duration::from_secs(interval_secs),
            move || {
                let manager = manager.clone();
                let config = job_config.clone();
                async move {
                    manager.run_guarded(config).await;
                }
            },
        );
        self.inner
            .scheduled
            .write()
            .await
            .insert(config.uid.clone(), handle);
        info!(
            uid = %config.uid,
            job_type = %config.job_type,
            interval_secs,
            "Scheduled job with fixed delay"
        );
    }

    /// Schedule a recurring job on a fixed cadence, first fire immediate
    pub async fn schedule_job_at_fixed_rate(&self, config: &JobConfiguration, interval_secs: u64) {
        if !self.precheck(config) {
            return;
        }
        self.stop_tracked_handle(&config.uid).await;

        let manager = self.clone();
        let job_config = config.clone();
        let handle = self
            .inner
            .trigger
            .schedule_fixed_rate(Duration::from_secs(interval_secs), move || {
                let manager = manager.clone();
                let config = job_config.clone();
                async move {
                    manager.run_guarded(config).await;
                }
            });
        self.inner
            .scheduled
            .write()
            .await
            .insert(config.uid.clone(), handle);
        info!(
            uid = %config.uid,
            job_type = %config.job_type,
            interval_secs,
            "Scheduled job at fixed rate"
        );
    }

    /// Execute a job immediately, outside the recurring-trigger path
    ///
    /// A no-op while a tracked immediate execution for this uid is still
    /// running; the type-level duplicate-run rule is applied when the
    /// execution actually starts.
    pub async fn execute_job(&self, config: &JobConfiguration) {
        if !config.has_uid() {
            warn!(name = %config.name, "Job configuration has no uid, not executing");
            return;
        }
        if self.is_job_in_progress(&config.uid).await {
            debug!(uid = %config.uid, "Job already in progress, ignoring execute request");
            return;
        }

        let manager = self.clone();
        let job_config = config.clone();
        let handle = self.inner.pool.submit(async move {
            manager.run_guarded(job_config).await;
        });

        // Replaces a completed or stopped handle left from a previous call
        self.inner
            .current_tasks
            .write()
            .await
            .insert(config.uid.clone(), handle);
        info!(uid = %config.uid, job_type = %config.job_type, "Submitted job for immediate execution");
    }

    /// Fire-and-forget submission, bypassing all tracking
    ///
    /// For collaborators that manage their own lifecycle.
    pub fn execute<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.pool.execute(task);
    }

    /// Submit work and get a handle to await its result
    pub fn submit<T, F>(&self, task: F) -> TaskResultHandle<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        self.inner.pool.submit_with_result(task)
    }

    // ---- stopping -------------------------------------------------------

    /// Stop a job by configuration
    pub async fn stop_job(&self, config: &JobConfiguration) {
        self.stop_job_by_uid(&config.uid).await;
    }

    /// Cancel any tracked handles for this uid and persist status Stopped
    ///
    /// The cancelled handles stay in their tracking maps so the stopped state
    /// remains observable through `get_job_status`; they are reaped on
    /// re-schedule, `stop_all_jobs` or `shutdown`. A no-op when the uid is not
    /// currently tracked.
    pub async fn stop_job_by_uid(&self, uid: &str) {
        let mut tracked = false;
        let mut cancelled = false;
        for map in [&self.inner.scheduled, &self.inner.current_tasks] {
            if let Some(handle) = map.read().await.get(uid) {
                tracked = true;
                if handle.cancel() {
                    cancelled = true;
                    info!(uid, "Cancelled job handle");
                } else {
                    debug!(uid, "Job handle already completed, nothing to cancel");
                }
            }
        }
        if !tracked {
            debug!(uid, "Stop requested for untracked job, ignoring");
            return;
        }

        match self.inner.store.get_job_configuration_by_uid(uid).await {
            Ok(Some(mut stored)) => {
                stored.job_status = JobStatus::Stopped;
                if cancelled {
                    stored.last_executed_status = LastExecutedStatus::Stopped;
                }
                if let Err(e) = self.inner.store.update_job_configuration(&stored).await {
                    warn!(uid, "Failed to persist stopped status: {e}");
                }
            }
            Ok(None) => debug!(uid, "No stored configuration to mark stopped"),
            Err(e) => warn!(uid, "Failed to load configuration while stopping: {e}"),
        }
    }

    /// Cancel every tracked scheduled handle, draining the handle map
    pub async fn stop_all_jobs(&self) {
        let drained: Vec<(String, ScheduledHandle)> =
            self.inner.scheduled.write().await.drain().collect();
        info!(count = drained.len(), "Stopping all scheduled jobs");
        for (uid, handle) in drained {
            if handle.cancel() {
                info!(uid = %uid, "Cancelled scheduled job");
            } else {
                warn!(uid = %uid, "Could not cancel scheduled job, handle already completed");
            }
        }
    }

    /// Cancel everything and wait for in-flight runs to drain
    ///
    /// Teardown path for process exit; waits up to the configured grace
    /// period for the running set to empty.
    pub async fn shutdown(&self) {
        self.stop_all_jobs().await;

        let current: Vec<(String, ScheduledHandle)> =
            self.inner.current_tasks.write().await.drain().collect();
        for (uid, handle) in current {
            if handle.cancel() {
                info!(uid = %uid, "Cancelled immediate execution");
            }
        }

        info!("Waiting for running jobs to complete...");
        let mut poll = interval(self.inner.drain_poll);
        let started = std::time::Instant::now();
        loop {
            let running = self.inner.running.len().await;
            if running == 0 {
                info!("All running jobs completed");
                break;
            }
            if started.elapsed() > self.inner.shutdown_grace {
                warn!(
                    running,
                    uids = ?self.inner.running.running_uids().await,
                    "Timeout waiting for running jobs, proceeding with shutdown"
                );
                break;
            }
            debug!(running, "Still waiting for running jobs to complete");
            poll.tick().await;
        }
    }

    // ---- status ---------------------------------------------------------

    /// Derive the status of a job purely from its tracked handle
    ///
    /// No handle means the job has not fired or been submitted: Scheduled.
    pub async fn get_job_status(&self, uid: &str) -> JobStatus {
        if let Some(handle) = self.inner.scheduled.read().await.get(uid) {
            return Self::derive_status(handle);
        }
        if let Some(handle) = self.inner.current_tasks.read().await.get(uid) {
            return Self::derive_status(handle);
        }
        JobStatus::Scheduled
    }

    /// Whether the tracked immediate execution for this uid is still running
    pub async fn is_job_in_progress(&self, uid: &str) -> bool {
        self.inner
            .current_tasks
            .read()
            .await
            .get(uid)
            .map(|h| Self::derive_status(h) == JobStatus::Running)
            .unwrap_or(false)
    }

    /// Counts of tracked handles and running configurations
    pub async fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            scheduled_jobs: self.inner.scheduled.read().await.len(),
            current_tasks: self.inner.current_tasks.read().await.len(),
            running_jobs: self.inner.running.len().await,
        }
    }

    fn derive_status(handle: &ScheduledHandle) -> JobStatus {
        if handle.is_cancelled() {
            JobStatus::Stopped
        } else if handle.is_done() {
            JobStatus::Completed
        } else {
            JobStatus::Running
        }
    }

    // ---- execution wrapper ----------------------------------------------

    /// Guarded execution shared by every trigger and immediate path
    ///
    /// Applies the duplicate-run rule, brackets the job body with running-set
    /// and persisted-status bookkeeping, and guarantees the cleanup path runs
    /// whatever the job does. Job failures end here: logged, reported through
    /// the notifier, recorded on the configuration, never propagated.
    async fn run_guarded(&self, config: JobConfiguration) {
        if !self.inner.running.try_insert(&config).await {
            debug!(
                uid = %config.uid,
                job_type = %config.job_type,
                "A job of this type is already running, skipping execution"
            );
            return;
        }

        let run_id = Uuid::new_v4();

        let mut started = config.clone();
        started.job_status = JobStatus::Running;
        if let Err(e) = self.inner.store.update_job_configuration(&started).await {
            warn!(uid = %config.uid, %run_id, "Failed to persist running status: {e}");
        }

        info!(uid = %config.uid, job_type = %config.job_type, %run_id, "Job execution started");
        let outcome = match self.inner.registry.lookup(config.job_type) {
            Some(job) => {
                AssertUnwindSafe(job.execute(&config, self, self.inner.notifier.as_ref()))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("job panicked")))
            }
            None => Err(SchedulingError::JobNotRegistered {
                job_type: config.job_type,
            }
            .into()),
        };

        match &outcome {
            Ok(()) => {
                info!(uid = %config.uid, %run_id, "Job execution completed");
            }
            Err(e) => {
                error!(uid = %config.uid, job_type = %config.job_type, %run_id, "Job execution failed: {e:#}");
                self.inner
                    .notifier
                    .notify(&config, &format!("Job '{}' failed: {e:#}", config.name))
                    .await;
            }
        }

        self.inner.running.remove(&config.uid).await;
        self.finish_run(&config, outcome.is_ok()).await;
    }

    /// Post-run bookkeeping against the persisted configuration
    ///
    /// Re-fetches the stored configuration so a mid-run disable is observed
    /// and demoted to Disabled instead of going back to Scheduled.
    async fn finish_run(&self, config: &JobConfiguration, success: bool) {
        let stored = match self.inner.store.get_job_configuration_by_uid(&config.uid).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(uid = %config.uid, "Failed to reload configuration after run: {e}");
                None
            }
        };
        let mut updated = stored.unwrap_or_else(|| config.clone());
        updated.last_executed = Some(Utc::now());
        updated.last_executed_status = if success {
            LastExecutedStatus::Success
        } else {
            LastExecutedStatus::Failed
        };
        updated.job_status = if updated.enabled {
            JobStatus::Scheduled
        } else {
            info!(uid = %config.uid, "Configuration disabled during run, demoting to disabled");
            JobStatus::Disabled
        };
        if let Err(e) = self.inner.store.update_job_configuration(&updated).await {
            warn!(uid = %config.uid, "Failed to persist run outcome: {e}");
        }
    }

    // ---- helpers --------------------------------------------------------

    /// Shared schedule-time checks: uid present, job validation passes
    fn precheck(&self, config: &JobConfiguration) -> bool {
        if !config.has_uid() {
            warn!(name = %config.name, "Job configuration has no uid, not scheduling");
            return false;
        }
        if let Some(job) = self.inner.registry.lookup(config.job_type) {
            if let Err(e) = job.validate() {
                warn!(uid = %config.uid, job_type = %config.job_type, "Job validation failed, not scheduling: {e}");
                return false;
            }
        }
        true
    }

    /// Supersede-on-reschedule: cancel and drop any handle tracked for this uid
    async fn stop_tracked_handle(&self, uid: &str) {
        if let Some(existing) = self.inner.scheduled.write().await.remove(uid) {
            if existing.cancel() {
                debug!(uid, "Cancelled previously tracked schedule before re-scheduling");
            } else {
                debug!(uid, "Previously tracked schedule already completed");
            }
        }
    }
}
