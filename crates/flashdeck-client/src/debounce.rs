//! Trailing-edge debounce for async actions.
//!
//! # Design
//! - Each `schedule` supersedes timers that have not fired yet.
//! - An action that already started runs to completion.
//! - Dropping the debouncer cancels unfired timers.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

struct Timer {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

/// Runs only the most recently scheduled action, once the delay elapses quietly.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
    timers: Mutex<Vec<Timer>>,
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Timer")
            .field("fired", &self.fired.load(Ordering::SeqCst))
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

impl Debouncer {
    /// Debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            timers: Mutex::new(Vec::new()),
        }
    }

    /// Quiet period.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` after the delay unless another call supersedes it first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let fired = Arc::new(AtomicBool::new(false));
        let delay = self.delay;
        let handle = tokio::spawn({
            let fired = Arc::clone(&fired);
            async move {
                tokio::time::sleep(delay).await;
                fired.store(true, Ordering::SeqCst);
                if current.load(Ordering::SeqCst) == generation {
                    action.await;
                }
            }
        });

        let mut timers = self.lock();
        abort_unfired(&mut timers);
        timers.push(Timer { handle, fired });
    }

    /// Drop any timer that has not fired.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        abort_unfired(&mut self.lock());
    }

    /// Whether a timer is waiting or an action is still running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lock().iter().any(|timer| !timer.handle.is_finished())
    }

    /// Wait for the pending timer to fire and every started action to finish.
    pub async fn settle(&self) {
        loop {
            let timers = std::mem::take(&mut *self.lock());
            if timers.is_empty() {
                return;
            }
            for timer in timers {
                // Aborted timers resolve with a cancellation error.
                let _ = timer.handle.await;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Timer>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let timers = self
            .timers
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        abort_unfired(timers);
    }
}

fn abort_unfired(timers: &mut Vec<Timer>) {
    timers.retain(|timer| {
        if timer.handle.is_finished() {
            return false;
        }
        if timer.fired.load(Ordering::SeqCst) {
            return true;
        }
        timer.handle.abort();
        false
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_action(counter: Arc<AtomicUsize>, value: usize) -> impl Future<Output = ()> {
        async move {
            counter.store(value, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_action_runs_after_quiet_period() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let seen = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        for value in 1..=3 {
            let runs = Arc::clone(&runs);
            let store = counter_action(Arc::clone(&seen), value);
            debouncer.schedule(async move {
                runs.fetch_add(1, Ordering::SeqCst);
                store.await;
            });
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        debouncer.settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_action() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let seen = Arc::new(AtomicUsize::new(0));
        debouncer.schedule(counter_action(Arc::clone(&seen), 7));
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        debouncer.settle().await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn running_action_is_not_aborted_by_reschedule() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let finished = Arc::new(AtomicUsize::new(0));
        {
            let finished = Arc::clone(&finished);
            debouncer.schedule(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
        debouncer.schedule(counter_action(Arc::new(AtomicUsize::new(0)), 1));
        debouncer.settle().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
