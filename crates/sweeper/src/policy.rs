use std::time::Duration;

use {
    chrono::{DateTime, TimeDelta, Utc},
    prunebot_config::{RetentionConfig, RetryConfig},
};

/// How long messages live and how sweeps are paced. Fixed for the process
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Messages at or before `now - window` are deleted.
    pub window: Duration,
    /// Time between two sweep starts.
    pub interval: Duration,
    /// Pause after each deletion within a channel.
    pub pacing: Duration,
    pub retry: RetryPolicy,
    pub dry_run: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from(&RetentionConfig::default())
    }
}

impl From<&RetentionConfig> for RetentionPolicy {
    fn from(cfg: &RetentionConfig) -> Self {
        Self {
            window: cfg.window(),
            interval: cfg.interval(),
            pacing: cfg.pacing(),
            retry: RetryPolicy::from(&cfg.retry),
            dry_run: cfg.dry_run,
        }
    }
}

impl RetentionPolicy {
    /// Latest creation time a message may have and still be deleted.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX);
        now.checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Bounded exponential backoff around a single delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff before retry number `attempt + 1` (`attempt` is zero-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
