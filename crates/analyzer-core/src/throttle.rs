//! Fixed-delay rate limiting.
//!
//! Upstream APIs used here publish simple requests-per-second guidance
//! rather than quota headers, so each provider sleeps for a fixed interval
//! before every request it makes. The delay is unconditional: it does not
//! measure elapsed time since the last call.

use std::time::Duration;

/// Sleeps for a fixed interval before each wrapped call.
///
/// Each provider owns its own `FixedDelay`; delays are not shared or
/// coordinated across providers.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Creates a limiter that sleeps for `delay` before each call.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a limiter that never sleeps. Intended for tests.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// Returns the configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits out the configured delay.
    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn zero_delay_returns_immediately() {
        let limiter = FixedDelay::none();
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn nonzero_delay_sleeps() {
        let limiter = FixedDelay::new(Duration::from_millis(20));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
