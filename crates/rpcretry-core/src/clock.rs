//! Time source for the retry loop.
//!
//! The loop never reads the process clock directly; it goes through [`Clock`]
//! so tests (and the CLI simulator) can run against simulated time.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Read the current time and block for a duration.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock: `Instant::now` and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated clock: `sleep` advances time instantly.
///
/// Clones share the same time, so an operation under test can hold one
/// clone and [`advance`](ManualClock::advance) it to model work that takes
/// time, while the retry loop reads another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    now: Arc<Mutex<Instant>>,
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        let origin = Instant::now();
        Self {
            origin,
            now: Arc::new(Mutex::new(origin)),
            slept: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Move simulated time forward. Stops at the latest representable
    /// `Instant` instead of overflowing.
    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now = saturating_add(*now, by);
    }

    /// Simulated time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        lock(&self.now).saturating_duration_since(self.origin)
    }

    /// Every duration passed to `sleep`, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.slept).clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *lock(&self.now)
    }

    fn sleep(&self, duration: Duration) {
        lock(&self.slept).push(duration);
        self.advance(duration);
    }
}

/// `t + by`, or the furthest instant reachable from `t` when that overflows.
fn saturating_add(t: Instant, by: Duration) -> Instant {
    if let Some(later) = t.checked_add(by) {
        return later;
    }
    // t + lo is representable, t + hi is not.
    let (mut lo, mut hi) = (0u128, by.as_nanos());
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if t.checked_add(from_nanos(mid)).is_some() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    t.checked_add(from_nanos(lo)).unwrap_or(t)
}

fn from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    Duration::new(
        (nanos / NANOS_PER_SEC) as u64,
        (nanos % NANOS_PER_SEC) as u32,
    )
}

// Poisoning is ignored: the guarded values are plain data.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
