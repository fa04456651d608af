//! Chat protocol over an [`autosocket`] connection

pub mod commands;
#[cfg(debug_assertions)]
pub mod debug;
pub mod endpoint;
pub mod events;
pub mod service;

pub use commands::{ChannelViewState, ChatCommand};
#[cfg(debug_assertions)]
pub use debug::{ChatDebugHooks, DebugAction};
pub use endpoint::resolve_endpoint;
pub use events::{ChatEvent, EventName};
pub use service::{ChatClient, ChatError, ChatSocket};

pub use autosocket::{ClientEvent, ListenerId, Topic};
