//! Bounded wait-and-retry primitive for remote processing.
//!
//! Waits grow exponentially from `initial_interval` up to `max_interval`.
//! Polling stops when the attempt budget or the total wait budget runs out.
//! Elapsed time is the sum of requested waits, so a fake [`Sleeper`] gives
//! deterministic timeouts. Dropping the future cancels the wait.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Something that can wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time waits on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polling budget and backoff shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Wait before the first re-query
    pub initial_interval: Duration,
    /// Upper bound for a single wait
    pub max_interval: Duration,
    /// Growth factor between waits; 1.0 gives a fixed interval
    pub multiplier: f64,
    /// Maximum number of re-queries
    pub max_attempts: Option<u32>,
    /// Maximum total time spent waiting
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            multiplier: 1.5,
            max_attempts: Some(300),
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl PollPolicy {
    /// One-second fixed interval with no bounds.
    pub fn unbounded_fixed() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(1),
            multiplier: 1.0,
            max_attempts: None,
            timeout: None,
        }
    }

    /// Wait before re-query number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
        let delay = self.initial_interval.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_interval.as_secs_f64()))
    }
}

/// Progress of one polling loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollBudget {
    pub attempts: u32,
    pub waited: Duration,
}

impl PollBudget {
    /// Wait before the next re-query, or `None` if the budget is spent.
    pub fn next_delay(&self, policy: &PollPolicy) -> Option<Duration> {
        if policy.max_attempts.is_some_and(|max| self.attempts >= max) {
            return None;
        }
        let delay = policy.delay_for(self.attempts);
        if policy.timeout.is_some_and(|limit| self.waited + delay > limit) {
            return None;
        }
        Some(delay)
    }

    pub fn record(&mut self, delay: Duration) {
        self.attempts += 1;
        self.waited += delay;
    }
}
