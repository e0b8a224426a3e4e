//! Trigger scheduling: turning a trigger definition into a stream of fires
//!
//! Owns no business state. Each `schedule_*` spawns a driving task that
//! sleeps until the trigger's next fire time and invokes the supplied
//! callback, returning a cancellable [`ScheduledHandle`]. Cancellation
//! reliably prevents future fires; a fire already in flight runs to
//! completion.

use crate::scheduling::handle::ScheduledHandle;
use chrono::Utc;
use cron::Schedule;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Converts trigger definitions into fire callbacks
#[derive(Debug, Default)]
pub struct TriggerScheduler;

impl TriggerScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Fire on each cron-computed occurrence until cancelled or the schedule
    /// is exhausted
    pub fn schedule_cron<F, Fut>(&self, schedule: Schedule, callback: F) -> ScheduledHandle
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.drive(move |token| async move {
            loop {
                if token.is_cancelled() {
                    break;
                }
                let now = Utc::now();
                let Some(next) = schedule.after(&now).next() else {
                    debug!("Cron schedule has no further occurrences, trigger exhausted");
                    break;
                };
                let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => callback().await,
                }
            }
        })
    }

    /// Fire exactly once at the given future instant
    pub fn schedule_at<F, Fut>(&self, when: chrono::DateTime<Utc>, callback: F) -> ScheduledHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.drive(move |token| async move {
            let delay = (when - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => callback().await,
            }
        })
    }

    /// Fire at `first_run`, then repeatedly with `delay` measured from the
    /// completion of the previous fire
    pub fn schedule_fixed_delay<F, Fut>(
        &self,
        first_run: chrono::DateTime<Utc>,
        delay: Duration,
        callback: F,
    ) -> ScheduledHandle
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.drive(move |token| async move {
            let initial = (first_run - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(initial) => {}
            }
            loop {
                callback().await;
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        })
    }

    /// Fire immediately and then on every `rate` tick, regardless of how long
    /// each fire takes
    pub fn schedule_fixed_rate<F, Fut>(&self, rate: Duration, callback: F) -> ScheduledHandle
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.drive(move |token| async move {
            // interval() panics on a zero period
            let mut ticks = interval(rate.max(Duration::from_millis(1)));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => callback().await,
                }
            }
        })
    }

    fn drive<B, Fut>(&self, body: B) -> ScheduledHandle
    where
        B: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let task_token = token.clone();
        let task_finished = finished.clone();
        let join = tokio::spawn(async move {
            body(task_token).await;
            task_finished.store(true, Ordering::SeqCst);
        });
        ScheduledHandle::new(token, join.abort_handle(), finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> futures::future::Ready<()>) {
        let count = Arc::new(AtomicUsize::new(0));
        let fired = count.clone();
        let callback = move || {
            fired.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        };
        (count, callback)
    }

    #[tokio::test]
    async fn test_fixed_rate_fires_repeatedly() {
        let scheduler = TriggerScheduler::new();
        let (count, callback) = counter();

        let handle = scheduler.schedule_fixed_rate(Duration::from_millis(20), callback);
        tokio::time::sleep(Duration::from_millis(90)).await;
        handle.cancel();

        let fired = count.load(Ordering::SeqCst);
        assert!(fired >= 3, "expected at least 3 fires, got {fired}");
    }

    #[tokio::test]
    async fn test_cancel_prevents_future_fires() {
        let scheduler = TriggerScheduler::new();
        let (count, callback) = counter();

        let handle = scheduler.schedule_fixed_rate(Duration::from_millis(20), callback);
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.cancel();
        let at_cancel = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_cancel);
        assert!(handle.is_cancelled());
        assert!(handle.is_done());
    }

    #[tokio::test]
    async fn test_one_shot_fires_once_and_completes() {
        let scheduler = TriggerScheduler::new();
        let (count, callback) = counter();

        let when = Utc::now() + chrono::Duration::milliseconds(20);
        let handle = scheduler.schedule_at(when, callback);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handle.is_done());
        assert!(!handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_fixed_delay_waits_for_first_run() {
        let scheduler = TriggerScheduler::new();
        let (count, callback) = counter();

        let first_run = Utc::now() + chrono::Duration::milliseconds(60);
        let handle =
            scheduler.schedule_fixed_delay(first_run, Duration::from_millis(20), callback);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(count.load(Ordering::SeqCst) >= 1);
        handle.cancel();
    }

    #[tokio::test]
    async fn test_cron_trigger_fires_on_schedule() {
        let scheduler = TriggerScheduler::new();
        let (count, callback) = counter();

        // Every second; the test waits a little over one second
        let schedule = Schedule::from_str("* * * * * *").unwrap();
        let handle = scheduler.schedule_cron(schedule, callback);
        tokio::time::sleep(Duration::from_millis(1200)).await;
        handle.cancel();

        assert!(count.load(Ordering::SeqCst) >= 1);
    }
}
