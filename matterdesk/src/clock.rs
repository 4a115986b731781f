//! Time source for settle delays and polling waits.
//!
//! The driven application gives no completion events, so every state read is preceded by
//! a wait. All of those waits go through a [`Clock`] so tests can run them on virtual time.

use crate::errors::AutomationError;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

pub trait Clock: Send + Sync {
    /// Monotonic time elapsed since the clock was created.
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock: `sleep` advances time instantly and every sleep is recorded.
#[derive(Default)]
pub struct FakeClock {
    state: Mutex<FakeClockState>,
}

#[derive(Default)]
struct FakeClockState {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.now += by;
        }
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .map(|s| s.sleeps.clone())
            .unwrap_or_default()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.state.lock().map(|s| s.now).unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.now += duration;
            state.sleeps.push(duration);
        }
    }
}

/// Polls `predicate` every `poll_interval` until it returns true or `timeout` elapses.
///
/// The predicate is always evaluated at least once, and once more at the deadline, so the
/// worst-case latency is `timeout` plus one predicate evaluation.
pub fn wait_until<F>(
    clock: &dyn Clock,
    timeout: Duration,
    poll_interval: Duration,
    mut predicate: F,
) -> Result<(), AutomationError>
where
    F: FnMut() -> bool,
{
    let start = clock.now();
    loop {
        if predicate() {
            return Ok(());
        }
        let elapsed = clock.now().saturating_sub(start);
        if elapsed >= timeout {
            debug!("wait_until gave up after {:?}", elapsed);
            return Err(AutomationError::Timeout(format!(
                "condition not met within {timeout:?}"
            )));
        }
        let remaining = timeout - elapsed;
        clock.sleep(poll_interval.min(remaining).max(Duration::from_millis(1)));
    }
}
