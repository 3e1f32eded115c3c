//! Time utilities shared across crates

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in milliseconds.
///
/// # Panics
/// Panics if the system clock is set before the Unix epoch, which would
/// indicate a severely misconfigured system.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_millis() as u64
}

/// Milliseconds elapsed since a given timestamp, or 0 if it is in the future.
pub fn elapsed_millis(since: u64) -> u64 {
    current_time_millis().saturating_sub(since)
}

/// Elapsed time as a `Duration` since a given millisecond timestamp.
pub fn elapsed_duration(since_millis: u64) -> Duration {
    Duration::from_millis(elapsed_millis(since_millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_time_millis_is_positive() {
        assert!(current_time_millis() > 0);
    }

    #[test]
    fn test_elapsed_millis_advances() {
        let start = current_time_millis();
        std::thread::sleep(Duration::from_millis(5));
        assert!(elapsed_millis(start) >= 5);
    }

    #[test]
    fn test_elapsed_millis_future_time_is_zero() {
        let future = current_time_millis() + 60_000;
        assert_eq!(elapsed_millis(future), 0);
    }
}
