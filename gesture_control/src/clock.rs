//! Time source for retention, activity windows and debouncing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant { Instant::now() }
}

/// Time that only moves when told to. Clones share one reading.
#[derive(Clone, Debug)]
pub struct ManualClock {
    base:   Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self { ManualClock::starting_at(Instant::now()) }
}

impl ManualClock {
    pub fn new() -> Self { ManualClock::default() }

    pub fn starting_at(base: Instant) -> Self {
        ManualClock { base, offset: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// Jump to `base + offset`. Never moves backwards.
    pub fn set_offset(&self, offset: Duration) {
        let mut cur = self.offset.lock();
        *cur = (*cur).max(offset);
    }

    pub fn base(&self) -> Instant { self.base }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant { self.base + *self.offset.lock() }
}
