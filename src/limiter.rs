//! Sliding-window admission control for outbound tracker calls
//!
//! At most `max_calls` admissions happen inside any trailing 60 second window.
//! A caller that would exceed the bound waits until the oldest admission ages
//! out, after which the window is reset to hold only that caller's call.
//!
//! Admission decisions are serialized through a single async mutex. Tokio's
//! mutex is fair, so waiting callers are admitted one at a time in arrival
//! order and a throttled caller never blocks the runtime thread.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::config::ConfigError;

/// Length of the trailing window
pub const WINDOW: Duration = Duration::from_secs(60);

/// Slack added to computed waits so the oldest call has left the window
const ADMISSION_SLACK: Duration = Duration::from_millis(100);

/// Admission controller shared by all callers of one client
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    /// Admission timestamps inside the trailing window, oldest first
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter admitting `max_calls` calls per window
    ///
    /// # Returns
    /// * `Err(ConfigError::InvalidRateLimit)` if `max_calls` is zero
    pub fn new(max_calls: u32) -> Result<Self, ConfigError> {
        if max_calls == 0 {
            return Err(ConfigError::InvalidRateLimit(0));
        }

        Ok(Self {
            max_calls: max_calls as usize,
            window: Mutex::new(VecDeque::with_capacity(max_calls as usize)),
        })
    }

    /// Waits until a call may be made and records it
    ///
    /// Dropping the returned future while it waits leaves the window untouched;
    /// the timestamp is recorded only once the wait completes.
    ///
    /// # Returns
    /// How long the caller was throttled (zero when admitted immediately)
    pub async fn acquire(&self) -> Duration {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        prune(&mut window, now);

        if window.len() < self.max_calls {
            window.push_back(now);
            return Duration::ZERO;
        }

        let oldest = window.front().copied().unwrap_or(now);
        let wait = WINDOW.saturating_sub(now.duration_since(oldest)) + ADMISSION_SLACK;
        warn!(
            wait_ms = wait.as_millis() as u64,
            limit = self.max_calls,
            "rate limit reached, delaying call"
        );
        tokio::time::sleep(wait).await;

        window.clear();
        window.push_back(Instant::now());
        wait
    }

    /// Number of admissions currently inside the window
    pub async fn in_window(&self) -> usize {
        let mut window = self.window.lock().await;
        prune(&mut window, Instant::now());
        window.len()
    }
}

/// Drops timestamps that are a full window old or older
fn prune(window: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&oldest) = window.front() {
        if now.duration_since(oldest) < WINDOW {
            break;
        }
        window.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_zero_limit_is_rejected() {
        assert!(matches!(
            RateLimiter::new(0),
            Err(ConfigError::InvalidRateLimit(0))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_under_limit_are_admitted_immediately() {
        let limiter = RateLimiter::new(3).unwrap();
        let start = Instant::now();

        for _ in 0..3 {
            assert_eq!(limiter.acquire().await, Duration::ZERO);
        }

        assert_eq!(Instant::now(), start);
        assert_eq!(limiter.in_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_call_waits_for_window_with_limit_of_two() {
        let limiter = RateLimiter::new(2).unwrap();
        let start = Instant::now();

        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        let waited = limiter.acquire().await;

        assert!(waited >= WINDOW - elapsed);
        assert!(start.elapsed() >= WINDOW, "Third call admitted inside the window");
        assert_eq!(limiter.in_window().await, 1, "Window resets after a wait");
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_calls_are_pruned() {
        let limiter = RateLimiter::new(1).unwrap();

        limiter.acquire().await;
        tokio::time::advance(WINDOW).await;

        assert_eq!(limiter.in_window().await, 0);
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::new(1).unwrap());
        let mut handles = Vec::new();

        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut admitted = Vec::new();
        for handle in handles {
            admitted.push(handle.await.unwrap());
        }
        admitted.sort();

        for pair in admitted.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= WINDOW);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_leaves_window_untouched() {
        let limiter = RateLimiter::new(1).unwrap();
        limiter.acquire().await;

        let cancelled = tokio::time::timeout(Duration::from_secs(1), limiter.acquire()).await;

        assert!(cancelled.is_err(), "Acquire should still be waiting");
        assert_eq!(limiter.in_window().await, 1);
    }
}
