//! Manual override lock and the clock it is compared against

use chrono::{DateTime, Duration, Utc};
use std::fmt::Debug;

/// Source of wall-clock time
///
/// Lock expiry is a pure comparison against `now()`, so tests swap in a
/// manually advanced clock instead of sleeping.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time until which automatic control is suppressed
///
/// The relay is locked while `now < locked_until`; the Unix epoch means
/// unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockGuard {
    locked_until: DateTime<Utc>,
}

impl Default for LockGuard {
    fn default() -> Self {
        Self {
            locked_until: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl LockGuard {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        now < self.locked_until
    }

    pub fn clear(&mut self) {
        self.locked_until = DateTime::<Utc>::UNIX_EPOCH;
    }

    /// Lock until `now + duration`. A zero duration expires immediately.
    /// Durations past the representable range saturate.
    pub fn arm(&mut self, now: DateTime<Utc>, duration: Duration) {
        self.locked_until = now
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// Expiry time, or `None` when not locked at `now`
    pub fn locked_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.is_locked(now).then_some(self.locked_until)
    }
}
