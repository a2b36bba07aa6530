//! Time source for issuance stamps and completion-date checks.
//!
//! The registry reads its clock exactly once per mutating operation, under
//! the write lock, so every record in a batch shares one instant and
//! issuance times never run backwards across identifiers.

use std::sync::Arc;

use certreg_core::Timestamp;
use parking_lot::Mutex;

/// Source of "current system time".
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock UTC time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A settable clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// A clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to `ts`.
    pub fn set(&self, ts: Timestamp) {
        *self.now.lock() = ts;
    }

    /// Move forward by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        let mut now = self.now.lock();
        *now = now.plus_secs(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
