use std::time::Duration;

/// Retry policy for idempotent requests
#[derive(Clone, Debug, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub initial: Duration,
    /// Upper bound for any single delay
    pub max: Duration,
    /// Retries allowed before giving up
    pub max_attempts: u32,
    /// Fraction of each delay randomized away, between 0.0 and 1.0
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            max: Duration::from_secs(4),
            max_attempts: 3,
            jitter: 0.2,
        }
    }
}

/// Capped exponential backoff
#[derive(Clone, Debug)]
pub struct Backoff {
    config: BackoffConfig,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.config.max_attempts
    }

    /// Delay to wait before the next attempt, or `None` once all attempts are
    /// used up
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        let factor = 2u32.saturating_pow(self.attempts);
        self.attempts += 1;

        let base = self
            .config
            .initial
            .checked_mul(factor)
            .unwrap_or(self.config.max)
            .min(self.config.max);

        let jitter = self.config.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return Some(base);
        }

        let scale = 1.0 - jitter * fastrand::f64();
        Some(base.mul_f64(scale))
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
