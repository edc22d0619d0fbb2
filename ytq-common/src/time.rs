//! Timestamp utilities
//!
//! All queue-domain gates measure intervals in whole seconds. Remaining
//! waits are rounded up so a caller told "wait N seconds" is never early.

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Seconds still to wait before `interval_secs` has elapsed since `since`.
///
/// Returns 0 once the interval has fully elapsed. A `since` in the future
/// (clock stepped backwards) counts as zero elapsed time.
pub fn remaining_seconds(since: DateTime<Utc>, now: DateTime<Utc>, interval_secs: u64) -> u64 {
    let elapsed_ms = (now - since).num_milliseconds().max(0) as u64;
    let interval_ms = interval_secs.saturating_mul(1000);

    if elapsed_ms >= interval_ms {
        0
    } else {
        (interval_ms - elapsed_ms).div_ceil(1000)
    }
}

/// Later of two timestamps; keeps per-identity stamps non-decreasing.
pub fn latest(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    if b > a {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(StdDuration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_remaining_seconds_immediately_after() {
        let t0 = now();
        assert_eq!(remaining_seconds(t0, t0, 180), 180);
    }

    #[test]
    fn test_remaining_seconds_rounds_up() {
        let t0 = now();
        let t1 = t0 + Duration::milliseconds(500);
        assert_eq!(remaining_seconds(t0, t1, 10), 10);

        let t2 = t0 + Duration::milliseconds(9_001);
        assert_eq!(remaining_seconds(t0, t2, 10), 1);
    }

    #[test]
    fn test_remaining_seconds_elapsed() {
        let t0 = now();
        assert_eq!(remaining_seconds(t0, t0 + Duration::seconds(10), 10), 0);
        assert_eq!(remaining_seconds(t0, t0 + Duration::seconds(3600), 10), 0);
    }

    #[test]
    fn test_remaining_seconds_zero_interval() {
        let t0 = now();
        assert_eq!(remaining_seconds(t0, t0, 0), 0);
    }

    #[test]
    fn test_remaining_seconds_clock_stepped_back() {
        let t0 = now();
        let earlier = t0 - Duration::seconds(30);
        assert_eq!(remaining_seconds(t0, earlier, 60), 60);
    }

    #[test]
    fn test_latest() {
        let t0 = now();
        let t1 = t0 + Duration::seconds(1);
        assert_eq!(latest(t0, t1), t1);
        assert_eq!(latest(t1, t0), t1);
    }
}
