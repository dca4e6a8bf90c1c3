//! Nullable clock: deterministic time for testing.

use civitas_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock. Time only moves when told to.
#[derive(Debug, Default)]
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }

    /// Move forward by `secs` and return the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        let previous = self.current.fetch_add(secs, Ordering::SeqCst);
        Timestamp::new(previous + secs)
    }

    /// Jump to `at`, typically the end of a phase window.
    pub fn set(&self, at: Timestamp) {
        self.current.store(at.as_secs(), Ordering::SeqCst);
    }
}
