//! Startup-time registry of job implementations

use crate::models::JobType;
use crate::services::Job;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Lookup table from job type to its implementation
///
/// Populated once during single-threaded startup by enumerating all known
/// job implementations, then handed to the manager and treated as immutable
/// for the life of the process. No interior locking is needed because every
/// write happens before the first concurrent read.
#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<JobType, Arc<dyn Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job implementation under its declared type
    ///
    /// A duplicate registration is a wiring bug; it is logged loudly and the
    /// first registration wins, but the process keeps running.
    pub fn register(&mut self, job: Arc<dyn Job>) {
        let job_type = job.job_type();
        if self.jobs.contains_key(&job_type) {
            error!(%job_type, "Job already registered for this type, keeping first registration");
            return;
        }
        debug!(%job_type, "Registered job implementation");
        self.jobs.insert(job_type, job);
    }

    /// Resolve the implementation for a job type
    pub fn lookup(&self, job_type: JobType) -> Option<Arc<dyn Job>> {
        self.jobs.get(&job_type).cloned()
    }

    /// All registered job types
    pub fn job_types(&self) -> Vec<JobType> {
        self.jobs.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobConfiguration;
    use crate::scheduling::SchedulingManager;
    use crate::services::Notifier;
    use async_trait::async_trait;

    struct StubJob {
        job_type: JobType,
        marker: &'static str,
    }

    #[async_trait]
    impl Job for StubJob {
        fn job_type(&self) -> JobType {
            self.job_type
        }

        async fn execute(
            &self,
            _config: &JobConfiguration,
            _manager: &SchedulingManager,
            _notifier: &dyn Notifier,
        ) -> anyhow::Result<()> {
            let _ = self.marker;
            Ok(())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = JobRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(StubJob {
            job_type: JobType::AnalyticsTable,
            marker: "first",
        }));

        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(JobType::AnalyticsTable).is_some());
        assert!(registry.lookup(JobType::DataSync).is_none());
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = JobRegistry::new();
        registry.register(Arc::new(StubJob {
            job_type: JobType::DataSync,
            marker: "first",
        }));
        registry.register(Arc::new(StubJob {
            job_type: JobType::DataSync,
            marker: "second",
        }));

        assert_eq!(registry.len(), 1);
        let job = registry.lookup(JobType::DataSync).unwrap();
        assert_eq!(job.job_type(), JobType::DataSync);
    }

    #[test]
    fn test_job_types_enumeration() {
        let mut registry = JobRegistry::new();
        registry.register(Arc::new(StubJob {
            job_type: JobType::Monitoring,
            marker: "m",
        }));
        registry.register(Arc::new(StubJob {
            job_type: JobType::SmsSend,
            marker: "s",
        }));

        let mut types = registry.job_types();
        types.sort_by_key(|t| t.to_string());
        assert_eq!(types, vec![JobType::Monitoring, JobType::SmsSend]);
    }
}
