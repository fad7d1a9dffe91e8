use lru::LruCache;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding-window limiter allowing `rate` uses per `per` for each user.
///
/// Only the most recently seen users are tracked, so memory stays bounded.
#[derive(Clone)]
pub struct RateLimiter {
    rate: usize,
    per: Duration,
    buckets: Arc<Mutex<LruCache<u64, VecDeque<Instant>>>>,
}

impl RateLimiter {
    pub fn new(rate: usize, per: Duration, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            rate: rate.max(1),
            per,
            buckets: Arc::new(Mutex::new(LruCache::new(cap))),
        }
    }

    /// Records a use at `now`. Returns how long to wait when the user is over the limit.
    pub fn check_at(&self, user_id: u64, now: Instant) -> Result<(), Duration> {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let uses = buckets.get_or_insert_mut(user_id, VecDeque::new);

        while uses
            .front()
            .is_some_and(|used| now.duration_since(*used) >= self.per)
        {
            uses.pop_front();
        }

        if uses.len() >= self.rate {
            let oldest = uses.front().copied().unwrap_or(now);
            return Err(self.per.saturating_sub(now.duration_since(oldest)));
        }

        uses.push_back(now);
        Ok(())
    }

    pub fn check(&self, user_id: u64) -> Result<(), Duration> {
        self.check_at(user_id, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_rate_uses_then_blocks() {
        let limiter = RateLimiter::new(2, Duration::from_secs(30), 10);
        let start = Instant::now();

        assert!(limiter.check_at(1, start).is_ok());
        assert!(limiter.check_at(1, start + Duration::from_secs(1)).is_ok());

        let retry = limiter
            .check_at(1, start + Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(retry, Duration::from_secs(20));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_secs(40), 10);
        let start = Instant::now();

        assert!(limiter.check_at(7, start).is_ok());
        assert!(limiter.check_at(7, start + Duration::from_secs(39)).is_err());
        assert!(limiter.check_at(7, start + Duration::from_secs(40)).is_ok());
    }

    #[test]
    fn users_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(30), 10);
        let now = Instant::now();

        assert!(limiter.check_at(1, now).is_ok());
        assert!(limiter.check_at(2, now).is_ok());
        assert!(limiter.check_at(1, now).is_err());
    }

    #[test]
    fn stays_within_capacity() {
        let limiter = RateLimiter::new(1, Duration::from_secs(30), 2);
        let now = Instant::now();

        limiter.check_at(1, now).unwrap();
        limiter.check_at(2, now).unwrap();
        limiter.check_at(3, now).unwrap();

        // user 1 was evicted, so its window starts over
        assert!(limiter.check_at(1, now).is_ok());
        assert_eq!(limiter.buckets.lock().unwrap().len(), 2);
    }
}
