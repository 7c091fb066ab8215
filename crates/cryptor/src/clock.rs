//! Wall-clock source for expiry checks.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in unix seconds.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Current unix time in whole seconds.
    fn now(&self) -> u64;
}

/// [`Clock`] backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
