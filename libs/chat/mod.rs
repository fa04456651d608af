//! Chat client domain layer
//!
//! Binds the generic reconnecting socket to the chat server's protocol:
//! the closed command and event sets, endpoint derivation, configuration
//! and logging.

pub mod infrastructure;
pub mod websocket;

// Re-export commonly used items
pub use infrastructure::{init_tracing, ConfigError, ReconnectConfig, SocketConfig};
pub use websocket::{
    resolve_endpoint, ChannelViewState, ChatClient, ChatCommand, ChatError, ChatEvent,
    ChatSocket, ClientEvent, EventName, ListenerId, Topic,
};

#[cfg(debug_assertions)]
pub use websocket::{ChatDebugHooks, DebugAction};
