//! Progress and failure notification seam

use crate::models::JobConfiguration;
use async_trait::async_trait;
use tracing::info;

/// Fire-and-forget reporting of job progress and failures
///
/// The platform routes these to its messaging subsystem. Notification is
/// strictly best-effort: the engine calls it and moves on, and a broken
/// notifier never affects scheduling state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, config: &JobConfiguration, message: &str);
}

/// Notifier that reports through the log only
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, config: &JobConfiguration, message: &str) {
        info!(
            uid = %config.uid,
            job_type = %config.job_type,
            "{message}"
        );
    }
}
