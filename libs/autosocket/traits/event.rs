//! Typed inbound events
//!
//! Every inbound frame is decoded into one value of a closed event enum.
//! The event's [`InboundEvent::Name`] selects which listeners receive it.
//!
//! ```text
//! WebSocket → frame → InboundEvent::decode → Listeners
//!                                              ├─ Topic::Event(name) handlers
//!                                              └─ Topic::All handlers
//! ```

use crate::error::{Result, SocketError};
use crate::parser::WsMessage;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::hash::Hash;

/// A closed set of inbound events
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Deserialize)]
/// #[serde(tag = "type", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
/// enum Event {
///     ClipFolderMessageAdded { folder_id: String, message_id: String },
///     ClipFolderMessageDeleted { folder_id: String, message_id: String },
/// }
///
/// impl InboundEvent for Event {
///     type Name = EventName;
///
///     fn decode(message: &WsMessage) -> Result<Self> {
///         decode_json(message)
///     }
///
///     fn name(&self) -> EventName {
///         match self {
///             Event::ClipFolderMessageAdded { .. } => EventName::ClipFolderMessageAdded,
///             Event::ClipFolderMessageDeleted { .. } => EventName::ClipFolderMessageDeleted,
///         }
///     }
/// }
/// ```
pub trait InboundEvent: Send + Sync + Debug + Sized + 'static {
    /// Fieldless tag identifying the event kind
    type Name: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Decode one raw frame
    ///
    /// Unknown names and malformed payloads must return
    /// [`SocketError::Decode`], never panic.
    ///
    /// # Performance
    /// Runs on the dispatcher thread for every frame.
    fn decode(message: &WsMessage) -> Result<Self>;

    /// Tag of this event
    fn name(&self) -> Self::Name;
}

/// Decode a JSON frame (text or binary) into `T`
pub fn decode_json<T: DeserializeOwned>(message: &WsMessage) -> Result<T> {
    let decoded = match message {
        WsMessage::Text(text) => serde_json::from_str(text),
        WsMessage::Binary(bytes) => serde_json::from_slice(bytes),
    };

    decoded.map_err(|e| SocketError::Decode(e.to_string()))
}
