//! Debouncing of bursty events
//!
//! [`Debouncer`] is a deadline tracker polled by its owner and driven by an
//! injectable [`Clock`]. [`DebouncedTask`] runs a callback on the tokio timer
//! instead, for hosts that would rather be called back than poll:
//!
//! ```no_run
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use clipshelf::debounce::DebouncedTask;
//!
//! # async fn watch_selection() {
//! let settled = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&settled);
//! let mut task = DebouncedTask::new(Duration::from_millis(200), move || {
//!     flag.store(true, Ordering::SeqCst);
//! });
//!
//! // Every pointer-up restarts the quiet period
//! task.trigger();
//! task.trigger();
//! # }
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

/// Source of monotonic time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Coalesces triggers into one firing `delay` after the last trigger
#[derive(Debug)]
pub struct Debouncer<C = SystemClock> {
    delay: Duration,
    clock: C,
    deadline: Option<Instant>,
}

impl Debouncer<SystemClock> {
    pub fn new(delay: Duration) -> Self {
        Self::with_clock(delay, SystemClock)
    }
}

impl<C: Clock> Debouncer<C> {
    pub fn with_clock(delay: Duration, clock: C) -> Self {
        Self {
            delay,
            clock,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any pending firing and schedule a new one
    pub fn trigger(&mut self) -> Instant {
        let deadline = self.clock.now() + self.delay;
        self.deadline = Some(deadline);
        deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the pending firing
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    /// Returns true once when the deadline has passed
    pub fn poll(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if self.clock.now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Debounced callback on the tokio timer.
///
/// Each trigger aborts the sleeping task and spawns a fresh one. Must be used
/// inside a tokio runtime.
pub struct DebouncedTask {
    delay: Duration,
    callback: Arc<dyn Fn() + Send + Sync>,
    handle: Option<JoinHandle<()>>,
}

impl DebouncedTask {
    pub fn new<F>(delay: Duration, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            delay,
            callback: Arc::new(callback),
            handle: None,
        }
    }

    pub fn trigger(&mut self) {
        self.cancel();

        let delay = self.delay;
        let callback = Arc::clone(&self.callback);
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for DebouncedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
