use exporter_core::BackoffKind;
use std::time::Duration;
use tracing::debug;

/// Configuration for reconnect behavior
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Linear step for network-level failures
    pub network_step: Duration,
    /// Cap for network-level backoff
    pub network_max: Duration,
    /// First delay after an HTTP error response
    pub http_initial: Duration,
    /// Cap for HTTP error backoff
    pub http_max: Duration,
    /// First delay after being rate limited
    pub rate_limit_initial: Duration,
    /// Cap for rate limit backoff
    pub rate_limit_max: Duration,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            network_step: Duration::from_millis(250),
            network_max: Duration::from_secs(16),
            http_initial: Duration::from_secs(5),
            http_max: Duration::from_secs(320),
            rate_limit_initial: Duration::from_secs(60),
            rate_limit_max: Duration::from_secs(960),
            jitter_factor: 0.1,
        }
    }
}

impl ReconnectConfig {
    /// Same schedules without jitter, for predictable delays.
    pub fn without_jitter() -> Self {
        Self {
            jitter_factor: 0.0,
            ..Self::default()
        }
    }
}

/// Tracks consecutive reconnect attempts and yields the next delay.
///
/// Network failures back off linearly, HTTP errors and rate limiting back
/// off exponentially. Switching to a different kind of failure starts that
/// schedule from the beginning; a successful connection resets everything.
#[derive(Debug)]
pub struct ReconnectBackoff {
    config: ReconnectConfig,
    current: Option<BackoffKind>,
    attempts: u32,
}

impl ReconnectBackoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            current: None,
            attempts: 0,
        }
    }

    pub fn next_delay(&mut self, kind: BackoffKind) -> Duration {
        if self.current != Some(kind) {
            self.current = Some(kind);
            self.attempts = 0;
        }
        self.attempts = self.attempts.saturating_add(1);

        let base = self.base_delay(kind, self.attempts);
        let delay = self.add_jitter(base);
        debug!(
            "Reconnect attempt {} ({:?}) scheduled in {:?}",
            self.attempts, kind, delay
        );
        delay
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn base_delay(&self, kind: BackoffKind, attempt: u32) -> Duration {
        match kind {
            BackoffKind::Network => self
                .config
                .network_step
                .saturating_mul(attempt)
                .min(self.config.network_max),
            BackoffKind::Http => {
                exponential(self.config.http_initial, attempt, self.config.http_max)
            }
            BackoffKind::RateLimited => exponential(
                self.config.rate_limit_initial,
                attempt,
                self.config.rate_limit_max,
            ),
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return delay;
        }
        let jitter = delay.as_secs_f64() * self.config.jitter_factor * fastrand::f64();
        delay + Duration::from_secs_f64(jitter)
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(ReconnectConfig::default())
    }
}

fn exponential(initial: Duration, attempt: u32, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    initial.saturating_mul(1u32 << exponent).min(max)
}
