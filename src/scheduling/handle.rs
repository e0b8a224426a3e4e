//! Cancellable handles for submitted executions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to one scheduled or submitted execution
///
/// Owned by the [`SchedulingManager`] tracking maps; represents the full life
/// of a trigger loop or one-shot task. Cancellation is cooperative: the
/// driving task observes the token at its next decision point, so an in-flight
/// job body may still run to completion while the engine already treats the
/// handle as stopped.
///
/// [`SchedulingManager`]: crate::scheduling::SchedulingManager
#[derive(Debug)]
pub struct ScheduledHandle {
    token: CancellationToken,
    task: AbortHandle,
    finished: Arc<AtomicBool>,
    cancelled: AtomicBool,
}

impl ScheduledHandle {
    pub(crate) fn new(token: CancellationToken, task: AbortHandle, finished: Arc<AtomicBool>) -> Self {
        Self {
            token,
            task,
            finished,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Request cancellation
    ///
    /// Returns false when the handle already terminated naturally, mirroring
    /// a failed cancel attempt; the engine logs that and moves on.
    pub fn cancel(&self) -> bool {
        if self.is_done() {
            debug!("Cancel requested for already-completed handle");
            return false;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        self.token.cancel();
        true
    }

    /// Whether the underlying task has terminated (naturally or after cancel)
    pub fn is_done(&self) -> bool {
        self.finished.load(Ordering::SeqCst) || self.task.is_finished()
    }

    /// Whether cancellation was requested through this handle
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Handle to a submitted task whose result the caller wants back
///
/// Unlike [`ScheduledHandle`] this is caller-owned and untracked; dropping it
/// detaches the task.
#[derive(Debug)]
pub struct TaskResultHandle<T> {
    handle: JoinHandle<T>,
}

impl<T> TaskResultHandle<T> {
    pub(crate) fn new(handle: JoinHandle<T>) -> Self {
        Self { handle }
    }

    /// Await the task's result
    pub async fn result(self) -> anyhow::Result<T> {
        self.handle
            .await
            .map_err(|e| anyhow::anyhow!("Submitted task failed to complete: {e}"))
    }

    /// Whether the task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Hard-stop the task
    pub fn cancel(&self) {
        self.handle.abort();
    }
}
