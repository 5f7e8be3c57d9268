//! Per-session checkout submission limiter.
//!
//! A sliding window of recent submission instants per key, held in a moka
//! cache so idle keys drop out on their own.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use moka::sync::Cache;

/// Upper bound on tracked keys.
const MAX_TRACKED_KEYS: u64 = 100_000;

/// Sliding-window limiter for checkout submissions.
#[derive(Clone)]
pub struct SubmissionLimiter {
    windows: Cache<String, Arc<Mutex<VecDeque<Instant>>>>,
    limit: usize,
    window: Duration,
}

impl SubmissionLimiter {
    /// Allow `limit` submissions per key within any `window`.
    #[must_use]
    pub fn new(limit: usize, window: Duration) -> Self {
        let windows = Cache::builder()
            .max_capacity(MAX_TRACKED_KEYS)
            .time_to_idle(window)
            .build();
        Self {
            windows,
            limit: limit.max(1),
            window,
        }
    }

    /// Record a submission for `key` now.
    ///
    /// # Errors
    ///
    /// Returns how long until the next submission would be accepted.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    /// Record a submission for `key` at `now`.
    ///
    /// Refused attempts are not recorded.
    ///
    /// # Errors
    ///
    /// Returns how long until the next submission would be accepted.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let entry = self
            .windows
            .get_with_by_ref(key, || Arc::new(Mutex::new(VecDeque::new())));
        let mut stamps = entry.lock().unwrap_or_else(PoisonError::into_inner);

        while stamps
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.window)
        {
            stamps.pop_front();
        }

        if stamps.len() >= self.limit {
            let oldest = stamps.front().copied().unwrap_or(now);
            let elapsed = now.saturating_duration_since(oldest);
            return Err(self.window.saturating_sub(elapsed));
        }

        stamps.push_back(now);
        Ok(())
    }
}

impl std::fmt::Debug for SubmissionLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionLimiter")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("tracked_keys", &self.windows.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(300);

    #[test]
    fn test_fourth_submission_in_window_refused() {
        let limiter = SubmissionLimiter::new(3, WINDOW);
        let start = Instant::now();
        for i in 0..3 {
            assert!(limiter.check_at("s1", start + Duration::from_secs(i * 10)).is_ok());
        }
        let retry = limiter
            .check_at("s1", start + Duration::from_secs(60))
            .unwrap_err();
        assert_eq!(retry, Duration::from_secs(240));
    }

    #[test]
    fn test_allowed_after_window_slides() {
        let limiter = SubmissionLimiter::new(3, WINDOW);
        let start = Instant::now();
        for i in 0..3 {
            limiter.check_at("s1", start + Duration::from_secs(i * 10)).unwrap();
        }
        assert!(limiter.check_at("s1", start + Duration::from_secs(299)).is_err());
        // The first stamp has aged out; the other two remain
        assert!(limiter.check_at("s1", start + Duration::from_secs(300)).is_ok());
        assert!(limiter.check_at("s1", start + Duration::from_secs(305)).is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = SubmissionLimiter::new(1, WINDOW);
        let now = Instant::now();
        assert!(limiter.check_at("a", now).is_ok());
        assert!(limiter.check_at("a", now).is_err());
        assert!(limiter.check_at("b", now).is_ok());
    }
}
