//! # AutoSocket Traits
//!
//! Core traits and types for the AutoSocket client library:
//!
//! - **CommandKind**: Closed set of outbound command kinds
//! - **InboundEvent**: Closed set of decoded inbound events
//! - **ReconnectionStrategy**: Control reconnection delays
//! - **Transport**: Open the underlying socket
//!
//! ## Example
//!
//! ```rust,ignore
//! use autosocket::*;
//!
//! impl InboundEvent for MyEvent {
//!     type Name = MyEventName;
//!
//!     fn decode(message: &WsMessage) -> Result<Self> {
//!         decode_json(message)
//!     }
//!
//!     fn name(&self) -> MyEventName {
//!         self.kind()
//!     }
//! }
//! ```

pub mod command;
pub mod error;
pub mod event;
pub mod parser;
pub mod reconnect;
pub mod transport;

// Re-export commonly used types
pub use command::{Command, CommandKind, COMMAND_DELIMITER};
pub use error::{Result, SocketError};
pub use event::{decode_json, InboundEvent};
pub use parser::WsMessage;
pub use reconnect::{ExponentialBackoff, ReconnectionStrategy, DEFAULT_BACKOFF_FACTOR};
pub use transport::{Connection, FrameSink, FrameStream, Transport};
