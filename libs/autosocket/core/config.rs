use crate::traits::*;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Reconnection timing, fixed for the lifetime of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectOptions {
    /// Base delay the backoff exponent is applied to
    pub min_delay: Duration,
    /// Upper bound on any single backoff wait
    pub max_delay: Duration,
    /// Time allowed for one connection attempt before it counts as failed
    pub connection_timeout: Duration,
}

impl Default for ReconnectOptions {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            connection_timeout: Duration::from_millis(4000),
        }
    }
}

impl ReconnectOptions {
    pub fn new(min_delay: Duration, max_delay: Duration, connection_timeout: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            connection_timeout,
        }
    }

    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Reject zero timings and an inverted delay range
    pub fn validate(&self) -> Result<()> {
        if self.min_delay.is_zero() {
            return Err(SocketError::Configuration("min_delay must be greater than 0".into()));
        }
        if self.max_delay < self.min_delay {
            return Err(SocketError::Configuration(format!(
                "max_delay ({:?}) must not be less than min_delay ({:?})",
                self.max_delay, self.min_delay
            )));
        }
        if self.connection_timeout.is_zero() {
            return Err(SocketError::Configuration(
                "connection_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Backoff strategy matching these options
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.min_delay, self.max_delay)
    }
}

/// Configuration for an [`AutoSocket`](crate::AutoSocket)
///
/// Built by the type-state builder and moved into the client task.
pub struct ClientConfig {
    /// Opens each underlying connection
    pub(crate) transport: Arc<dyn Transport>,

    /// Reconnection timing
    pub(crate) options: ReconnectOptions,

    /// Delay policy for the reconnect loop
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,

    /// Shutdown flag - when false, the client stops and never reconnects
    pub(crate) shutdown_flag: Arc<AtomicBool>,

    /// Forces establishment attempts to fail while set
    pub(crate) fault_injector: Arc<FaultInjector>,
}

impl ClientConfig {
    /// Endpoint of the configured transport
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub fn options(&self) -> &ReconnectOptions {
        &self.options
    }
}

/// Deterministic connection failure switch for testing and debugging
///
/// While enabled, every establishment attempt fails before the transport
/// is touched, which keeps the reconnect loop spinning until it is
/// disabled again.
#[derive(Debug, Default)]
pub struct FaultInjector {
    fail_connections: AtomicBool,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_connections(&self, fail: bool) {
        self.fail_connections
            .store(fail, std::sync::atomic::Ordering::Release);
    }

    pub fn fails_connections(&self) -> bool {
        self.fail_connections
            .load(std::sync::atomic::Ordering::Acquire)
    }
}
