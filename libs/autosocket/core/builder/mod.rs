pub mod states;

use crate::client::AutoSocket;
use crate::config::{ClientConfig, FaultInjector, ReconnectOptions};
use crate::traits::*;
use crate::transport::TungsteniteTransport;
use states::*;
use std::marker::PhantomData;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Type-state builder for [`AutoSocket`]
///
/// The type system enforces that an endpoint (a URL or a custom
/// transport) is set before the client can be built.
pub struct AutoSocketBuilder<S, K, E>
where
    S: EndpointState,
    K: CommandKind,
    E: InboundEvent,
{
    _state: TypeState<S>,
    _command_type: PhantomData<K>,
    _event_type: PhantomData<E>,
    url: Option<String>,
    protocols: Vec<String>,
    transport: Option<Arc<dyn Transport>>,
    options: ReconnectOptions,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    fault_injector: Option<Arc<FaultInjector>>,
}

impl<K, E> AutoSocketBuilder<NoEndpoint, K, E>
where
    K: CommandKind,
    E: InboundEvent,
{
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            _command_type: PhantomData,
            _event_type: PhantomData,
            url: None,
            protocols: Vec::new(),
            transport: None,
            options: ReconnectOptions::default(),
            reconnect_strategy: None,
            shutdown_flag: None,
            fault_injector: None,
        }
    }

    /// Connect to a WebSocket URL through `tokio-tungstenite`
    pub fn url(self, url: impl Into<String>) -> AutoSocketBuilder<HasEndpoint, K, E> {
        AutoSocketBuilder {
            _state: TypeState::new(),
            _command_type: PhantomData,
            _event_type: PhantomData,
            url: Some(url.into()),
            protocols: self.protocols,
            transport: None,
            options: self.options,
            reconnect_strategy: self.reconnect_strategy,
            shutdown_flag: self.shutdown_flag,
            fault_injector: self.fault_injector,
        }
    }

    /// Use a custom transport instead of a URL
    pub fn transport(self, transport: impl Transport) -> AutoSocketBuilder<HasEndpoint, K, E> {
        AutoSocketBuilder {
            _state: TypeState::new(),
            _command_type: PhantomData,
            _event_type: PhantomData,
            url: None,
            protocols: self.protocols,
            transport: Some(Arc::new(transport)),
            options: self.options,
            reconnect_strategy: self.reconnect_strategy,
            shutdown_flag: self.shutdown_flag,
            fault_injector: self.fault_injector,
        }
    }
}

impl<K, E> Default for AutoSocketBuilder<NoEndpoint, K, E>
where
    K: CommandKind,
    E: InboundEvent,
{
    fn default() -> Self {
        Self::new()
    }
}

// Optional configuration methods
impl<S, K, E> AutoSocketBuilder<S, K, E>
where
    S: EndpointState,
    K: CommandKind,
    E: InboundEvent,
{
    /// Sub-protocols offered during the handshake (URL endpoints only)
    pub fn protocols<I, P>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Reconnection timing; also drives the default backoff strategy
    pub fn reconnect_options(mut self, options: ReconnectOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the default [`ExponentialBackoff`] strategy
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    /// Set a custom shutdown flag for coordinated shutdown across components
    ///
    /// By default, the client creates an internal shutdown flag. When the
    /// flag is set to `false`, the client closes its connection and will
    /// not attempt reconnection.
    ///
    /// # Example
    /// ```ignore
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    ///
    /// let shutdown_flag = Arc::new(AtomicBool::new(true));
    ///
    /// let client = autosocket::builder::<Cmd, Event>()
    ///     .url("wss://chat.example.com/api/ws")
    ///     .shutdown_flag(Arc::clone(&shutdown_flag))
    ///     .build()?;
    ///
    /// // Later, from anywhere:
    /// shutdown_flag.store(false, Ordering::Release);
    /// ```
    pub fn shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Share a fault injector, e.g. to fail the very first connection
    pub fn fault_injector(mut self, injector: Arc<FaultInjector>) -> Self {
        self.fault_injector = Some(injector);
        self
    }
}

// Build method - only available once an endpoint is set
impl<K, E> AutoSocketBuilder<HasEndpoint, K, E>
where
    K: CommandKind,
    E: InboundEvent,
{
    /// Validate the configuration and spawn the client
    ///
    /// Must be called inside a tokio runtime. The client starts
    /// disconnected; call [`AutoSocket::connect`] to open it.
    pub fn build(self) -> Result<AutoSocket<K, E>> {
        self.options.validate()?;

        let transport: Arc<dyn Transport> = match (self.transport, self.url) {
            (Some(transport), _) => transport,
            (None, Some(url)) => {
                Arc::new(TungsteniteTransport::new(url).with_protocols(self.protocols))
            }
            (None, None) => {
                return Err(SocketError::Configuration("no endpoint configured".into()));
            }
        };

        let reconnect_strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(self.options.backoff()));

        let config = ClientConfig {
            transport,
            options: self.options,
            reconnect_strategy,
            shutdown_flag: self
                .shutdown_flag
                .unwrap_or_else(|| Arc::new(AtomicBool::new(true))),
            fault_injector: self.fault_injector.unwrap_or_default(),
        };

        AutoSocket::new(config)
    }
}
