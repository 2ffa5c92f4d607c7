//! Time sources
//!
//! The runner reads time and waits for its next timer through a [`Clock`], so
//! tests and replays can run on virtual time.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;

    /// Block until `deadline`; returns immediately if it has passed
    fn sleep_until(&self, deadline: Instant);
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

/// Virtual clock that only moves when told to
///
/// Clones share the same time, so a test can keep a handle while the runner
/// owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Instant at virtual time zero
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Virtual time since creation
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Move to `origin + at`. Time never goes backwards.
    pub fn advance_to(&self, at: Duration) {
        if at > self.elapsed.get() {
            self.elapsed.set(at);
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep_until(&self, deadline: Instant) {
        self.advance_to(deadline.saturating_duration_since(self.origin));
    }
}
