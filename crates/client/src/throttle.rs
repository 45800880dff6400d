//! Refetch throttling.
//!
//! Realtime pushes arrive in bursts (several messages delivered
//! together); each qualifying event wants the owning list refetched,
//! but the backend should see at most one refetch per window. A
//! trigger inside the window schedules a single deferred run for the
//! remainder of the window, replacing any previously scheduled one; a
//! trigger outside the window runs immediately. The window opens at
//! construction, when the owning store performs its initial snapshot
//! fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::platform::{self, TaskFn};

/// Window applied to conversation-list and friends-list refetches.
/// Part of the reconciliation contract, not a tuning knob.
pub const REFETCH_WINDOW_MS: u64 = 500;

struct ThrottleInner {
    window_ms: u64,
    task: TaskFn,
    last_run: Mutex<DateTime<Utc>>,
    generation: AtomicU64,
}

/// Coalesces trigger bursts into at most one task run per window.
#[derive(Clone)]
pub struct RefetchThrottle {
    inner: Arc<ThrottleInner>,
}

impl RefetchThrottle {
    pub fn new(window_ms: u64, task: TaskFn) -> Self {
        Self {
            inner: Arc::new(ThrottleInner {
                window_ms,
                task,
                last_run: Mutex::new(Utc::now()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Record a qualifying event.
    pub fn trigger(&self) {
        let now = Utc::now();
        let elapsed_ms = {
            let last = self
                .inner
                .last_run
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            (now - *last).num_milliseconds().max(0) as u64
        };

        if elapsed_ms >= self.inner.window_ms {
            // Outside the window: run now and invalidate any deferred run.
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            self.mark_ran(now);
            (self.inner.task)();
            return;
        }

        // Inside the window: (re)schedule the single deferred run.
        let remaining = self.inner.window_ms - elapsed_ms;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = self.inner.clone();
        platform::spawn(async move {
            platform::sleep_ms(remaining).await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                // Superseded by a later trigger (or an immediate run).
                return;
            }
            let mut last = inner.last_run.lock().unwrap_or_else(PoisonError::into_inner);
            *last = Utc::now();
            drop(last);
            (inner.task)();
        });
    }

    fn mark_ran(&self, at: DateTime<Utc>) {
        let mut last = self
            .inner
            .last_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = at;
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::platform::task;
    use std::sync::atomic::AtomicUsize;

    fn counting_throttle(window_ms: u64) -> (RefetchThrottle, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let throttle = RefetchThrottle::new(
            window_ms,
            task(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (throttle, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_coalesces_into_one_deferred_run() {
        let (throttle, runs) = counting_throttle(REFETCH_WINDOW_MS);

        for _ in 0..5 {
            throttle.trigger();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0, "nothing runs inside the window");

        // Let the deferred run fire at the window boundary.
        tokio::time::sleep(std::time::Duration::from_millis(2 * REFETCH_WINDOW_MS)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // No stragglers from the replaced schedules.
        tokio::time::sleep(std::time::Duration::from_millis(2 * REFETCH_WINDOW_MS)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn trigger_outside_window_runs_immediately() {
        let (throttle, runs) = counting_throttle(20);

        std::thread::sleep(std::time::Duration::from_millis(30));
        throttle.trigger();
        assert_eq!(runs.load(Ordering::SeqCst), 1, "ran synchronously");
    }

    #[tokio::test(start_paused = true)]
    async fn later_trigger_replaces_pending_run() {
        let (throttle, runs) = counting_throttle(REFETCH_WINDOW_MS);

        throttle.trigger();
        throttle.trigger();
        tokio::time::sleep(std::time::Duration::from_millis(3 * REFETCH_WINDOW_MS)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
