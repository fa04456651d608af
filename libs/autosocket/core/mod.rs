//! # AutoSocket core
//!
//! The client task, its configuration, the pending command queue and the
//! event multiplexer.
//!
//! ## Example
//!
//! ```rust,ignore
//! use autosocket::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = autosocket::builder::<ChatCommand, ChatEvent>()
//!         .url("wss://chat.example.com/api/ws")
//!         .reconnect_options(ReconnectOptions::default().with_max_delay(Duration::from_secs(3)))
//!         .build()?;
//!
//!     client.on(Topic::Event(EventName::MessageCreated), |event| {
//!         println!("{:?}", event);
//!         Ok(())
//!     });
//!
//!     // Queued until the connection opens
//!     client.send_command(ChatCommand::TimelineStreaming, ["on"])?;
//!     client.connect()?;
//!
//!     while let Ok(event) = client.recv_event() {
//!         println!("Lifecycle: {:?}", event);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod event_bus;
pub mod listener;
pub mod queue;
pub mod transport;

// Re-export main types
pub use builder::{states, AutoSocketBuilder};
pub use client::{AutoSocket, ClientEvent, DebugHooks, Metrics};
pub use config::{ClientConfig, FaultInjector, ReconnectOptions};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use event_bus::EVENT_BACKLOG;
pub use listener::{EventHandler, ListenerId, Listeners, Topic};
pub use queue::CommandQueue;
pub use transport::TungsteniteTransport;

// Re-export traits for convenience
pub use crate::traits::*;

/// Create a new client builder
///
/// # Example
/// ```ignore
/// let client = autosocket::builder::<ChatCommand, ChatEvent>()
///     .url("wss://chat.example.com/api/ws")
///     .protocols(["chat.v3"])
///     .build()?;
/// client.connect()?;
/// ```
pub fn builder<K, E>() -> AutoSocketBuilder<builder::states::NoEndpoint, K, E>
where
    K: CommandKind,
    E: InboundEvent,
{
    AutoSocketBuilder::new()
}
