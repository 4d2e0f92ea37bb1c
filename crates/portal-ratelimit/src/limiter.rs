//! Fixed-window limiter with a block period.
//!
//! Each identifier gets `points` requests per window. Exhausting the balance
//! blocks the identifier for `block_duration` from the moment of rejection;
//! requests during the block are rejected without touching the window.

use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::time::Instant;

use crate::profile::{LimiterProfile, MAX_PERIOD};

/// Per-identifier limiter state.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitState {
    pub remaining_points: u32,
    pub window_start: Instant,
    pub blocked_until: Option<Instant>,
}

impl RateLimitState {
    fn fresh(points: u32, now: Instant) -> Self {
        Self {
            remaining_points: points,
            window_start: now,
            blocked_until: None,
        }
    }

    fn refill(&mut self, points: u32, now: Instant) {
        *self = Self::fresh(points, now);
    }
}

/// Successful consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub remaining_points: u32,
    /// Time until the current window refills.
    pub ms_before_next: u64,
    pub limit: u32,
}

/// Rejected consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limit exceeded; retry in {ms_before_next}ms")]
pub struct RateLimited {
    /// Time until the identifier may try again.
    pub ms_before_next: u64,
    /// Always 0.
    pub remaining_points: u32,
    pub limit: u32,
}

/// A limiter for one endpoint class.
///
/// State is created on first use of an identifier and kept for the lifetime
/// of the limiter.
pub struct RateLimiter {
    profile: LimiterProfile,
    states: DashMap<String, RateLimitState>,
}

impl RateLimiter {
    pub fn new(profile: LimiterProfile) -> Self {
        Self {
            profile,
            states: DashMap::new(),
        }
    }

    pub fn profile(&self) -> LimiterProfile {
        self.profile
    }

    /// Consumes one point for `identifier`.
    ///
    /// The read-modify-write runs under the map's entry lock, so concurrent
    /// consumes for the same identifier never lose a decrement.
    pub fn consume(&self, identifier: &str) -> Result<Grant, RateLimited> {
        let now = Instant::now();
        let LimiterProfile {
            points,
            duration,
            block_duration,
        } = self.profile;
        let duration = duration.min(MAX_PERIOD);
        let block_duration = block_duration.min(MAX_PERIOD);

        let mut entry = self
            .states
            .entry(identifier.to_string())
            .or_insert_with(|| RateLimitState::fresh(points, now));
        let state = entry.value_mut();

        let blocked_until = state.blocked_until;
        match blocked_until {
            Some(until) if now < until => {
                return Err(self.rejection(until - now));
            }
            Some(_) => state.refill(points, now),
            None if now.duration_since(state.window_start) >= duration => {
                state.refill(points, now)
            }
            None => {}
        }

        if state.remaining_points == 0 {
            state.blocked_until = Some(now + block_duration);
            tracing::debug!(
                identifier = %identifier,
                block_secs = block_duration.as_secs(),
                "rate limit exhausted, identifier blocked"
            );
            return Err(self.rejection(block_duration));
        }

        state.remaining_points -= 1;
        let window_end = state.window_start + duration;
        Ok(Grant {
            remaining_points: state.remaining_points,
            ms_before_next: millis(window_end.saturating_duration_since(now)),
            limit: points,
        })
    }

    /// Current state for `identifier`, if tracked.
    pub fn state(&self, identifier: &str) -> Option<RateLimitState> {
        self.states.get(identifier).map(|entry| *entry)
    }

    /// Number of tracked identifiers.
    pub fn tracked(&self) -> usize {
        self.states.len()
    }

    fn rejection(&self, wait: Duration) -> RateLimited {
        RateLimited {
            ms_before_next: millis(wait),
            remaining_points: 0,
            limit: self.profile.points,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(points: u32, window: u64, block: u64) -> RateLimiter {
        RateLimiter::new(LimiterProfile::new(points, window, block))
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_points_succeed_then_block() {
        let limiter = limiter(5, 900, 900);

        for expected in (0..5).rev() {
            let grant = limiter.consume("1.2.3.4").unwrap();
            assert_eq!(grant.remaining_points, expected);
            assert_eq!(grant.limit, 5);
        }

        let rejected = limiter.consume("1.2.3.4").unwrap_err();
        assert_eq!(rejected.remaining_points, 0);
        assert_eq!(rejected.ms_before_next, 900_000);

        // Other identifiers are unaffected.
        assert!(limiter.consume("5.6.7.8").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_outlasts_window() {
        let limiter = limiter(2, 10, 60);
        limiter.consume("a").unwrap();
        limiter.consume("a").unwrap();
        assert!(limiter.consume("a").is_err());

        // The window would have refilled, but the block still applies.
        tokio::time::advance(Duration::from_secs(30)).await;
        let rejected = limiter.consume("a").unwrap_err();
        assert_eq!(rejected.ms_before_next, 30_000);

        tokio::time::advance(Duration::from_secs(30)).await;
        let grant = limiter.consume("a").unwrap();
        assert_eq!(grant.remaining_points, 1);
        assert!(limiter.state("a").unwrap().blocked_until.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_refill() {
        let limiter = limiter(3, 60, 60);
        limiter.consume("a").unwrap();
        limiter.consume("a").unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        let grant = limiter.consume("a").unwrap();
        assert_eq!(grant.remaining_points, 0);
        assert_eq!(grant.ms_before_next, 40_000);

        tokio::time::advance(Duration::from_secs(40)).await;
        let grant = limiter.consume("a").unwrap();
        assert_eq!(grant.remaining_points, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consumes_are_not_lost() {
        let limiter = Arc::new(limiter(100, 3600, 3600));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                (0..25).filter(|_| limiter.consume("shared").is_ok()).count()
            }));
        }

        let mut granted = 0;
        for handle in handles {
            granted += handle.await.unwrap();
        }

        assert_eq!(granted, 100);
        assert_eq!(limiter.tracked(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_periods_are_capped() {
        let limiter = RateLimiter::new(LimiterProfile {
            points: 1,
            duration: Duration::from_secs(u64::MAX),
            block_duration: Duration::from_secs(u64::MAX),
        });

        let grant = limiter.consume("a").unwrap();
        assert_eq!(grant.ms_before_next, millis(MAX_PERIOD));

        let rejected = limiter.consume("a").unwrap_err();
        assert_eq!(rejected.ms_before_next, millis(MAX_PERIOD));
        assert!(limiter.consume("a").is_err());
    }
}
