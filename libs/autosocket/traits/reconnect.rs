use std::time::Duration;

/// Default growth factor between consecutive reconnection delays
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.3;

/// Trait for defining reconnection strategies
///
/// Implement this trait to control how long the client waits before
/// each reconnection attempt after an unexpected disconnection.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - The reconnection attempt number, starting at 1 for the
    ///   first wait after a disconnection
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting until `connect()` is called again
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Reset the strategy state (called after successful connection)
    fn reset(&mut self) {}
}

/// Exponential backoff reconnection strategy
///
/// Delays grow as `min_delay * factor^attempt`, capped at `max_delay`.
/// There is no attempt limit: the client keeps retrying until the
/// server is reachable again or the client is shut down.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    min_delay: Duration,
    max_delay: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff strategy with the default factor (1.3)
    ///
    /// # Arguments
    /// * `min_delay` - Base delay the exponent is applied to
    /// * `max_delay` - The maximum delay between reconnects
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            factor: DEFAULT_BACKOFF_FACTOR,
        }
    }

    /// Override the growth factor
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Compute the capped delay for an attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let secs = self.min_delay.as_secs_f64() * self.factor.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());

        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_delay
        }
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        Some(self.delay_for(attempt))
    }
}
