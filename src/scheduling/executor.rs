//! Bounded executor pool on top of the tokio runtime

use crate::scheduling::handle::{ScheduledHandle, TaskResultHandle};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Worker pool for asynchronous job execution
///
/// Concurrency is bounded by a semaphore rather than dedicated threads: a
/// submitted task waits for a permit, runs to completion on the runtime, and
/// releases the permit. A failing or hung task occupies exactly one permit
/// and can never take the pool down with it.
#[derive(Debug)]
pub struct ExecutorPool {
    permits: Arc<Semaphore>,
}

impl ExecutorPool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Fire-and-forget execution, bypassing all tracking
    pub fn execute<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = self.permits.clone();
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!("Executor pool closed, dropping submitted task");
                return;
            };
            task.await;
        });
    }

    /// Submit a task and return a cancellable tracking handle
    ///
    /// Cancellation before the task has acquired a permit prevents it from
    /// ever starting; once started it runs to completion.
    pub fn submit<F>(&self, task: F) -> ScheduledHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = self.permits.clone();
        let token = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let task_token = token.clone();
        let task_finished = finished.clone();
        let join = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                permit = permits.acquire_owned() => {
                    if permit.is_ok() && !task_token.is_cancelled() {
                        task.await;
                    }
                }
            }
            task_finished.store(true, Ordering::SeqCst);
        });
        ScheduledHandle::new(token, join.abort_handle(), finished)
    }

    /// Submit work whose result the caller wants to await or inspect
    pub fn submit_with_result<T, F>(&self, task: F) -> TaskResultHandle<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let permits = self.permits.clone();
        TaskResultHandle::new(tokio::spawn(async move {
            // A closed semaphore only happens at process teardown; running the
            // task unthrottled is preferable to losing its result.
            let _permit = permits.acquire_owned().await.ok();
            task.await
        }))
    }

    /// Permits currently available
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_execute_runs_task() {
        let pool = ExecutorPool::new(4);
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        pool.execute(async move {
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_submit_with_result_returns_value() {
        let pool = ExecutorPool::new(2);
        let handle = pool.submit_with_result(async { "done" });
        assert_eq!(handle.result().await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let pool = ExecutorPool::new(2);
        let peak = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let peak = peak.clone();
            let active = active.clone();
            handles.push(pool.submit_with_result(async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.result().await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_submit_cancel_before_start() {
        let pool = ExecutorPool::new(1);
        let ran = Arc::new(AtomicBool::new(false));

        // Occupy the single permit
        let blocker = pool.submit(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let flag = ran.clone();
        let queued = pool.submit(async move {
            flag.store(true, Ordering::SeqCst);
        });
        assert!(queued.cancel());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!ran.load(Ordering::SeqCst));
        assert!(queued.is_done());
        blocker.cancel();
    }
}
