//! Time-related helpers.
//!
//! Re-exports Tokio's timer utilities together with the standard duration and
//! instant types, plus wall-clock helpers used for cache timestamps.

pub use tokio::time::{interval, sleep, sleep_until, timeout, Interval, Sleep, Timeout};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch according to the system clock.
///
/// Returns 0 if the clock is set before the epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(i64::MAX as u128) as i64)
        .unwrap_or(0)
}

/// Seconds since the Unix epoch according to the system clock.
pub fn now_secs() -> i64 {
    now_millis() / 1000
}
