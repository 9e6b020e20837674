//! Time utilities and defaults for rate caching.

use chrono::{DateTime, Duration, Utc};

/// Timing defaults.
pub mod constants {
    /// Default cache lifetime in minutes.
    pub const DEFAULT_CACHE_TTL_MINUTES: u64 = 60;

    /// Default HTTP request timeout in seconds.
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

    /// Default request timeout (10 seconds).
    pub fn request_timeout() -> std::time::Duration {
        std::time::Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Elapsed time since `since`. Never negative.
pub fn age(since: Timestamp) -> Duration {
    let elapsed = now() - since;
    if elapsed < Duration::zero() {
        Duration::zero()
    } else {
        elapsed
    }
}

/// Convert a minute count into a TTL, saturating instead of overflowing.
pub fn ttl_from_minutes(minutes: u64) -> Duration {
    let minutes = i64::try_from(minutes).unwrap_or(i64::MAX);
    Duration::try_minutes(minutes).unwrap_or(Duration::MAX)
}

/// Check whether something fetched at `fetched_at` has outlived `ttl`.
pub fn is_stale(fetched_at: Timestamp, ttl: Duration) -> bool {
    age(fetched_at) >= ttl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stale() {
        let recent = now() - Duration::seconds(10);
        assert!(!is_stale(recent, Duration::minutes(1)));

        let old = now() - Duration::minutes(10);
        assert!(is_stale(old, Duration::minutes(1)));
    }

    #[test]
    fn test_zero_ttl_is_always_stale() {
        assert!(is_stale(now(), Duration::zero()));
    }

    #[test]
    fn test_age_never_negative() {
        let future = now() + Duration::seconds(30);
        assert_eq!(age(future), Duration::zero());
    }

    #[test]
    fn test_ttl_from_minutes() {
        assert_eq!(ttl_from_minutes(60), Duration::minutes(60));
        assert_eq!(ttl_from_minutes(u64::MAX), Duration::MAX);
    }
}
