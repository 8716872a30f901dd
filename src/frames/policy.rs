//! Retry, backoff and pacing rules for the frame worker.

use std::time::Duration;

use rand::Rng;

use crate::api::FrameError;
use crate::config::FrameConfig;

/// What the worker does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Wait `delay`, then retry the same prompt.  `counts` is `false` when the
    /// wait was dictated by the server and should not use up a retry.
    Retry { delay: Duration, counts: bool },
    /// Retries exhausted: drop the prompt and move on.
    Abandon,
    /// Stop the whole session.
    Halt,
}

/// Timing and retry limits for one worker.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub request_timeout: Duration,
    pub inter_request_min: Duration,
    pub inter_request_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FrameConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            inter_request_min: Duration::from_millis(config.inter_request_min_ms),
            inter_request_max: Duration::from_millis(config.inter_request_max_ms),
        }
    }

    /// Backoff before retry number `retry` (0-based): `base * 2^retry`.
    ///
    /// ```
    /// use std::time::Duration;
    /// use story_frames::frames::RetryPolicy;
    /// use story_frames::config::FrameConfig;
    ///
    /// let policy = RetryPolicy::from_config(&FrameConfig::default());
    /// assert_eq!(policy.backoff(0), Duration::from_secs(5));
    /// assert_eq!(policy.backoff(2), Duration::from_secs(20));
    /// ```
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.min(16);
        self.backoff_base.saturating_mul(factor)
    }

    /// Decide how to react to `error` given `retries` already used.
    pub fn on_failure(&self, retries: u32, error: &FrameError) -> FailureAction {
        match error {
            _ if !error.is_retryable() => FailureAction::Halt,
            FrameError::RateLimited {
                retry_after: Some(delay),
            } => FailureAction::Retry {
                delay: *delay,
                counts: false,
            },
            _ if retries >= self.max_retries => FailureAction::Abandon,
            _ => FailureAction::Retry {
                delay: self.backoff(retries),
                counts: true,
            },
        }
    }

    /// Randomised pause between successful requests.
    pub fn inter_request_delay(&self) -> Duration {
        let (lo, hi) = if self.inter_request_min <= self.inter_request_max {
            (self.inter_request_min, self.inter_request_max)
        } else {
            (self.inter_request_max, self.inter_request_min)
        };
        if lo == hi {
            return lo;
        }
        let ms = rand::thread_rng().gen_range(lo.as_millis()..=hi.as_millis());
        Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}
