//! Rate limiter: a call budget per time window plus an in-flight ceiling.
//!
//! The window refills lazily on the first acquire after it expires. Both
//! counters live behind one mutex so a budget decrement and an in-flight
//! increment happen as a single step.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::types::{McpError, McpResult};

/// Retry hint for a rejected acquire when the in-flight ceiling is reached.
pub const CONCURRENCY_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitConfig {
    pub window_calls: u32,
    pub window_duration_seconds: u64,
    pub max_concurrent: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_calls: 1000,
            window_duration_seconds: 86_400,
            max_concurrent: 10,
        }
    }
}

impl RateLimitConfig {
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_duration_seconds)
    }
}

#[derive(Debug)]
struct RateBudget {
    remaining: u32,
    resets_at: Instant,
    in_flight: u32,
}

/// Point-in-time view of the budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBudgetSnapshot {
    pub remaining: u32,
    pub in_flight: u32,
    pub max_concurrent: u32,
    #[serde(serialize_with = "as_secs")]
    pub resets_in: Duration,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    budget: Mutex<RateBudget>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Arc<Self> {
        let budget = RateBudget {
            remaining: config.window_calls,
            resets_at: Instant::now() + config.window_duration(),
            in_flight: 0,
        };
        Arc::new(Self {
            config,
            budget: Mutex::new(budget),
        })
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, RateBudget> {
        // Counters change in one step, so a poisoned guard is still consistent.
        self.budget.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn refill_if_expired(&self, budget: &mut RateBudget, now: Instant) {
        if now >= budget.resets_at {
            budget.remaining = self.config.window_calls;
            budget.resets_at = now + self.config.window_duration();
        }
    }

    /// Take one call from the window budget and one in-flight slot.
    ///
    /// The window budget is checked first, then the ceiling. A rejected
    /// acquire changes nothing. The returned permit releases its slot when
    /// dropped.
    pub fn try_acquire(self: &Arc<Self>) -> McpResult<Permit> {
        let now = Instant::now();
        let mut budget = self.lock();
        self.refill_if_expired(&mut budget, now);

        if budget.remaining == 0 {
            let retry_after = budget.resets_at.saturating_duration_since(now);
            tracing::warn!(retry_after = ?retry_after, "Window call budget exhausted");
            return Err(McpError::RateLimitExceeded { retry_after });
        }
        if budget.in_flight >= self.config.max_concurrent {
            tracing::warn!(
                in_flight = budget.in_flight,
                max_concurrent = self.config.max_concurrent,
                "In-flight ceiling reached"
            );
            return Err(McpError::ConcurrencyLimitExceeded {
                retry_after: CONCURRENCY_RETRY_AFTER,
            });
        }

        budget.remaining -= 1;
        budget.in_flight += 1;
        tracing::debug!(
            remaining = budget.remaining,
            in_flight = budget.in_flight,
            "Permit acquired"
        );
        Ok(Permit {
            limiter: Arc::clone(self),
        })
    }

    fn release(&self) {
        let mut budget = self.lock();
        budget.in_flight = budget.in_flight.saturating_sub(1);
        tracing::debug!(in_flight = budget.in_flight, "Permit released");
    }

    pub fn snapshot(&self) -> RateBudgetSnapshot {
        let now = Instant::now();
        let mut budget = self.lock();
        self.refill_if_expired(&mut budget, now);
        RateBudgetSnapshot {
            remaining: budget.remaining,
            in_flight: budget.in_flight,
            max_concurrent: self.config.max_concurrent,
            resets_in: budget.resets_at.saturating_duration_since(now),
        }
    }

    pub fn in_flight(&self) -> u32 {
        self.lock().in_flight
    }
}

/// In-flight slot held for the duration of one handler call.
#[must_use = "dropping the permit releases it immediately"]
#[derive(Debug)]
pub struct Permit {
    limiter: Arc<RateLimiter>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(
        window_calls: u32,
        window_duration_seconds: u64,
        max_concurrent: u32,
    ) -> Arc<RateLimiter> {
        RateLimiter::new(RateLimitConfig {
            window_calls,
            window_duration_seconds,
            max_concurrent,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_call_in_window_rate_limited() {
        let limiter = limiter(2, 60, 1);
        drop(limiter.try_acquire().unwrap());
        drop(limiter.try_acquire().unwrap());
        match limiter.try_acquire() {
            Err(McpError::RateLimitExceeded { retry_after }) => {
                assert_eq!(retry_after, Duration::from_secs(60));
            }
            other => panic!("expected RateLimitExceeded, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_rejects_while_permit_held() {
        let limiter = limiter(2, 60, 1);
        let held = limiter.try_acquire().unwrap();
        assert!(matches!(
            limiter.try_acquire(),
            Err(McpError::ConcurrencyLimitExceeded { retry_after })
                if retry_after == CONCURRENCY_RETRY_AFTER
        ));
        // Rejection consumed no budget.
        assert_eq!(limiter.snapshot().remaining, 1);
        drop(held);
        assert!(limiter.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_gate_checked_before_ceiling() {
        let limiter = limiter(1, 60, 1);
        let _held = limiter.try_acquire().unwrap();
        assert!(matches!(
            limiter.try_acquire(),
            Err(McpError::RateLimitExceeded { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limits_always_reject() {
        assert!(matches!(
            limiter(0, 60, 5).try_acquire(),
            Err(McpError::RateLimitExceeded { .. })
        ));
        assert!(matches!(
            limiter(5, 60, 0).try_acquire(),
            Err(McpError::ConcurrencyLimitExceeded { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_refills_lazily() {
        let limiter = limiter(1, 60, 4);
        drop(limiter.try_acquire().unwrap());
        tokio::time::advance(Duration::from_secs(45)).await;
        match limiter.try_acquire() {
            Err(McpError::RateLimitExceeded { retry_after }) => {
                assert_eq!(retry_after, Duration::from_secs(15));
            }
            other => panic!("expected RateLimitExceeded, got {other:?}"),
        }
        tokio::time::advance(Duration::from_secs(16)).await;
        drop(limiter.try_acquire().unwrap());
        let snap = limiter.snapshot();
        assert_eq!(snap.remaining, 0);
        assert_eq!(snap.resets_in, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_keeps_in_flight_count() {
        let limiter = limiter(1, 10, 2);
        let held = limiter.try_acquire().unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        let second = limiter.try_acquire().unwrap();
        assert_eq!(limiter.in_flight(), 2);
        drop(held);
        drop(second);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_permit_released_on_panic() {
        let limiter = limiter(10, 60, 1);
        let l = Arc::clone(&limiter);
        let joined = tokio::spawn(async move {
            let _permit = l.try_acquire().unwrap();
            panic!("handler blew up");
        })
        .await;
        assert!(joined.is_err());
        assert_eq!(limiter.in_flight(), 0);
    }

    #[test]
    fn test_default_config() {
        let config: RateLimitConfig = serde_json::from_str(r#"{"maxConcurrent": 3}"#).unwrap();
        assert_eq!(config.window_calls, 1000);
        assert_eq!(config.window_duration(), Duration::from_secs(86_400));
        assert_eq!(config.max_concurrent, 3);
    }
}
