//! Wall-clock abstraction: owns "now" for the demo service and inbox.
//!
//! RULE: Nothing outside this module may call `Utc::now()` directly.
//! Services receive an `Arc<dyn Clock>` so tests can pin and advance time.

use crate::types::Timestamp;
use chrono::{Duration, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The real clock. Used by the runner binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { current: Mutex::new(start) }
    }

    /// Move forward by `by`. Returns the new time.
    pub fn advance(&self, by: Duration) -> Timestamp {
        let mut current = self.lock();
        *current += by;
        *current
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Timestamp> {
        // A poisoned clock still holds a valid timestamp.
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.lock()
    }
}
