//! Per-key sliding-window limiter for public form submissions.
//!
//! State lives in process memory only and is lost on restart.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use dashmap::DashMap;

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: DashMap::new(),
        }
    }

    /// Records a request for `key` and returns whether it is admitted.
    /// Rejected requests are not recorded.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.entry(key.to_string()).or_default();
        while hits
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            hits.pop_front();
        }
        if hits.len() >= self.max_requests {
            return false;
        }
        hits.push_back(now);
        true
    }

    /// Drops keys with no request inside the window.
    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    pub fn prune_at(&self, now: Instant) {
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|t| now.saturating_duration_since(*t) < self.window)
        });
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_limit_per_key() {
        let limiter = RateLimiter::new(5, Duration::from_secs(3600));
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.check_at("bookings:1.2.3.4", now));
        }
        assert!(!limiter.check_at("bookings:1.2.3.4", now));
        assert!(limiter.check_at("bookings:5.6.7.8", now));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("k", start));
        assert!(limiter.check_at("k", start + Duration::from_secs(30)));
        assert!(!limiter.check_at("k", start + Duration::from_secs(59)));
        assert!(limiter.check_at("k", start + Duration::from_secs(60)));
        assert!(!limiter.check_at("k", start + Duration::from_secs(61)));
    }

    #[test]
    fn prune_forgets_idle_keys() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("fresh", start + Duration::from_secs(8));

        limiter.prune_at(start + Duration::from_secs(12));
        assert_eq!(limiter.tracked_keys(), 1);
        assert!(limiter.check_at("old", start + Duration::from_secs(12)));
    }
}
