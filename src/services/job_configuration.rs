//! Job configuration persistence seam

use crate::models::JobConfiguration;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persistence of job configurations and their run status
///
/// The platform supplies a store backed by its relational database; the
/// engine only sequences reads and writes around runs, with no transactional
/// coupling between the store and the in-memory scheduler state.
#[async_trait]
pub trait JobConfigurationService: Send + Sync {
    /// Persist the given configuration, replacing the stored one
    async fn update_job_configuration(&self, config: &JobConfiguration) -> Result<()>;

    /// Fetch a configuration by uid, if present
    async fn get_job_configuration_by_uid(&self, uid: &str) -> Result<Option<JobConfiguration>>;
}

/// In-memory configuration store
///
/// Used by the test suite and by embedders that have not wired a persistent
/// store yet.
#[derive(Debug, Default)]
pub struct InMemoryJobConfigurationService {
    configs: RwLock<HashMap<String, JobConfiguration>>,
}

impl InMemoryJobConfigurationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a configuration
    pub async fn insert(&self, config: JobConfiguration) {
        self.configs
            .write()
            .await
            .insert(config.uid.clone(), config);
    }
}

#[async_trait]
impl JobConfigurationService for InMemoryJobConfigurationService {
    async fn update_job_configuration(&self, config: &JobConfiguration) -> Result<()> {
        self.configs
            .write()
            .await
            .insert(config.uid.clone(), config.clone());
        Ok(())
    }

    async fn get_job_configuration_by_uid(&self, uid: &str) -> Result<Option<JobConfiguration>> {
        Ok(self.configs.read().await.get(uid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobStatus, JobType};

    #[tokio::test]
    async fn test_in_memory_store_roundtrip() {
        let store = InMemoryJobConfigurationService::new();
        let config = JobConfiguration::new("u1", "analytics", JobType::AnalyticsTable);

        assert!(store
            .get_job_configuration_by_uid("u1")
            .await
            .unwrap()
            .is_none());

        store.update_job_configuration(&config).await.unwrap();

        let fetched = store
            .get_job_configuration_by_uid("u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.name, "analytics");
        assert_eq!(fetched.job_status, JobStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_update_replaces_stored_state() {
        let store = InMemoryJobConfigurationService::new();
        let mut config = JobConfiguration::new("u1", "analytics", JobType::AnalyticsTable);
        store.insert(config.clone()).await;

        config.job_status = JobStatus::Running;
        store.update_job_configuration(&config).await.unwrap();

        let fetched = store
            .get_job_configuration_by_uid("u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.job_status, JobStatus::Running);
    }
}
