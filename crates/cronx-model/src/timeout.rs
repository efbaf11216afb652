use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound (and fallback) for a dispatched task's timeout: one day.
pub const MAX_TIMEOUT_SECS: u32 = 86_400;

/// Upper bound (and fallback) for HTTP-type tasks.
pub const HTTP_MAX_TIMEOUT_SECS: u32 = 300;

/// A task timeout that is guaranteed to lie in `(0, cap]` seconds.
///
/// Raw values come from user-edited task definitions and may be zero,
/// negative or absurdly large. Anything outside the range collapses to the
/// cap rather than being clamped to the nearest bound, so "no timeout
/// configured" (`0`) means "run for at most a day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeout(u32);

impl Timeout {
    /// Normalize a raw timeout against [`MAX_TIMEOUT_SECS`].
    pub fn normalize(secs: i64) -> Self {
        Self::normalize_with_cap(secs, MAX_TIMEOUT_SECS)
    }

    /// Normalize a raw timeout against an explicit cap.
    pub fn normalize_with_cap(secs: i64, cap: u32) -> Self {
        if secs <= 0 || secs > i64::from(cap) {
            Timeout(cap)
        } else {
            Timeout(secs as u32)
        }
    }

    #[inline]
    pub fn secs(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout(MAX_TIMEOUT_SECS)
    }
}
