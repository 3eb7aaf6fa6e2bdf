//! Per-identity rate limiting.
//!
//! One counter per caller identity over a rolling window. Expired entries
//! are replaced on lookup; a background sweep removes entries for idle
//! identities so the map stays bounded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

/// Identity used for callers without a resolvable identity. They all share
/// one counter.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
}

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// Sliding-window request quota keyed by caller identity.
///
/// All read-modify-write sequences go through one mutex guarding the whole
/// map, so concurrent checks cannot lose updates.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    /// Check whether `identity` may submit another request, counting this
    /// call against its window.
    pub fn check(&self, identity: &str) -> RateDecision {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        // An expired entry is treated as absent
        if let Some(entry) = entries.get(identity) {
            if now.duration_since(entry.window_start) >= self.window {
                entries.remove(identity);
            }
        }

        match entries.get_mut(identity) {
            None => {
                entries.insert(
                    identity.to_string(),
                    WindowEntry {
                        count: 1,
                        window_start: now,
                    },
                );
                RateDecision {
                    allowed: true,
                    remaining: self.limit.saturating_sub(1),
                }
            }
            Some(entry) => {
                entry.count += 1;
                RateDecision {
                    allowed: entry.count <= self.limit,
                    remaining: self.limit.saturating_sub(entry.count),
                }
            }
        }
    }

    /// Remove all expired entries. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.window_start) < self.window);
        before - entries.len()
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Spawn the background sweep loop (period = window length).
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let limiter = self;
        // The ticker starts counting from here, not from the task's first poll
        let mut ticker = interval(limiter.window);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::spawn(async move {
            // The first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!(removed, "Swept expired rate-limit entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_requests_within_limit_are_admitted() {
        let limiter = RateLimiter::new(10, WINDOW);

        for i in 1..=10u32 {
            let decision = limiter.check("1.2.3.4");
            assert!(decision.allowed, "request {} should be admitted", i);
            assert_eq!(decision.remaining, 10 - i);
        }
    }

    #[tokio::test]
    async fn test_request_over_limit_is_rejected() {
        let limiter = RateLimiter::new(10, WINDOW);

        for _ in 0..10 {
            assert!(limiter.check("1.2.3.4").allowed);
        }
        let decision = limiter.check("1.2.3.4");
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let limiter = RateLimiter::new(1, WINDOW);

        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_expiry() {
        let limiter = RateLimiter::new(2, WINDOW);

        assert!(limiter.check("a").allowed);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);

        tokio::time::advance(WINDOW).await;

        let decision = limiter.check("a");
        assert!(decision.allowed, "fresh window should admit again");
        assert_eq!(decision.remaining, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired_entries() {
        let limiter = RateLimiter::new(10, WINDOW);

        limiter.check("old");
        tokio::time::advance(WINDOW / 2).await;
        limiter.check("young");
        assert_eq!(limiter.tracked_identities(), 2);

        tokio::time::advance(WINDOW / 2).await;

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_identities(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_bounds_idle_identities() {
        let limiter = Arc::new(RateLimiter::new(10, WINDOW));
        let handle = Arc::clone(&limiter).spawn_sweeper();

        limiter.check("idle");
        assert_eq!(limiter.tracked_identities(), 1);

        tokio::time::advance(WINDOW + Duration::from_secs(1)).await;
        tokio::task::yield_now().await;

        assert_eq!(limiter.tracked_identities(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_unknown_identities_share_a_counter() {
        let limiter = RateLimiter::new(2, WINDOW);

        assert!(limiter.check(UNKNOWN_IDENTITY).allowed);
        assert!(limiter.check(UNKNOWN_IDENTITY).allowed);
        assert!(!limiter.check(UNKNOWN_IDENTITY).allowed);
    }
}
