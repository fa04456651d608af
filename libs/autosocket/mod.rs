//! # AutoSocket
//!
//! A self-healing WebSocket client: one logical connection that survives
//! network failures.
//!
//! ## Features
//!
//! - **Infinite reconnection**: Capped exponential backoff (factor 1.3), never gives up
//! - **Offline command queue**: Latest command per kind is kept and flushed on reconnect
//! - **Typed fan-out**: Closed event enums dispatched to per-name and wildcard listeners
//! - **Single owner**: One tokio task owns the socket, so queue and state never race
//! - **Type-state builder**: Compile-time guarantee that an endpoint is configured

pub mod traits;
pub mod core;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use self::core::{
    builder, client, config, connection_state, event_bus, listener, queue, transport,
    builder::{states, AutoSocketBuilder},
    client::{AutoSocket, ClientEvent, DebugHooks, Metrics},
    config::{ClientConfig, FaultInjector, ReconnectOptions},
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState},
    event_bus::EVENT_BACKLOG,
    listener::{EventHandler, ListenerId, Listeners, Topic},
    queue::CommandQueue,
    transport::TungsteniteTransport,
};

// Convenience function
pub use self::core::builder as client_builder;
pub use self::core::builder::states::{HasEndpoint, NoEndpoint};

/// Type alias for Result with SocketError
pub type Result<T> = std::result::Result<T, traits::SocketError>;
