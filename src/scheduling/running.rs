//! In-memory set of currently executing job configurations

use crate::models::JobConfiguration;
use tokio::sync::RwLock;
use tracing::debug;

/// Insertion-ordered set of configurations whose run is in flight
///
/// Only non-continuous configurations are tracked here; continuous jobs are
/// exempt from the duplicate-run rule and never enter the set. Membership is
/// checked by job type, not uid: two distinct configurations of the same type
/// exclude each other.
#[derive(Debug, Default)]
pub struct RunningJobSet {
    entries: RwLock<Vec<JobConfiguration>>,
}

impl RunningJobSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot for this configuration's job type
    ///
    /// The duplicate check and the insertion happen under a single write
    /// lock, so two concurrent fires of the same type cannot both claim the
    /// slot. Returns false when a non-continuous run of the same type is
    /// already tracked. Continuous configurations always succeed and are
    /// never tracked.
    pub async fn try_insert(&self, config: &JobConfiguration) -> bool {
        if config.continuous_execution {
            return true;
        }
        let mut entries = self.entries.write().await;
        if entries
            .iter()
            .any(|c| c.job_type == config.job_type && !c.continuous_execution)
        {
            return false;
        }
        debug!(uid = %config.uid, job_type = %config.job_type, "Marked configuration as running");
        entries.push(config.clone());
        true
    }

    /// Record a run as finished
    pub async fn remove(&self, uid: &str) {
        let mut entries = self.entries.write().await;
        if let Some(pos) = entries.iter().position(|c| c.uid == uid) {
            let removed = entries.remove(pos);
            debug!(uid = %removed.uid, "Removed configuration from running set");
        }
    }

    /// Number of tracked running configurations
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Uids of currently running configurations, in start order
    pub async fn running_uids(&self) -> Vec<String> {
        self.entries.read().await.iter().map(|c| c.uid.clone()).collect()
    }
}
