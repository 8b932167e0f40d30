// ABOUTME: Wall-clock abstraction injected into the append and query engines.
// ABOUTME: SystemClock reads local time; ManualClock is a settable clock for tests and replays.

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime, TimeDelta};

/// Source of "now" in local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.lock() = at;
    }

    /// Move the clock forward by whole milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.lock();
        *now += TimeDelta::milliseconds(millis);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        // A poisoned lock still holds a valid timestamp.
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}
