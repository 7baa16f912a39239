//! Scheduler handle passed through to transport collaborators.
//!
//! The SockJS service never schedules anything itself; it only hands this
//! handle to [`TransportHandler`](super::TransportHandler)s, which use it for
//! heartbeat and disconnect timers.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Shortest period accepted by [`TaskScheduler::schedule_with_fixed_delay`].
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Spawns timer tasks on a Tokio runtime.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    handle: Handle,
}

impl TaskScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler for the runtime the caller is running on.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// Run `task` every `period`, first after one full period.
    ///
    /// Periods shorter than [`MIN_PERIOD`] are raised to it.
    pub fn schedule_with_fixed_delay<F, Fut>(&self, period: Duration, mut task: F) -> ScheduledTask
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if period < MIN_PERIOD {
            tracing::warn!(period = ?period, "Fixed-delay period too short, using {:?}", MIN_PERIOD);
        }
        let period = period.max(MIN_PERIOD);
        let join = self.handle.spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                task().await;
            }
        });
        ScheduledTask { join }
    }

    /// Run `task` once after `delay`.
    pub fn schedule_once<Fut>(&self, delay: Duration, task: Fut) -> ScheduledTask
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        ScheduledTask { join }
    }
}

/// A scheduled task. Aborted on [`cancel`](Self::cancel) or drop.
#[derive(Debug)]
pub struct ScheduledTask {
    join: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn cancel(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.join.abort();
    }
}
