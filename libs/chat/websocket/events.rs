//! Inbound chat events
//!
//! The server pushes JSON frames shaped as `{"type": "<NAME>", "body": {...}}`.
//! Each frame decodes into one [`ChatEvent`]; unknown names and malformed
//! bodies are decode failures.

use autosocket::{decode_json, InboundEvent, WsMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Bodies
// =============================================================================

/// Body carrying only the id of the affected entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdBody {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelViewer {
    pub user_id: String,
    pub state: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelViewersBody {
    pub id: String,
    #[serde(default)]
    pub viewers: Vec<ChannelViewer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStampedBody {
    pub message_id: String,
    pub user_id: String,
    pub stamp_id: String,
    pub count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUnstampedBody {
    pub message_id: String,
    pub user_id: String,
    pub stamp_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePinBody {
    pub message_id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipFolderMessageBody {
    pub folder_id: String,
    pub message_id: String,
}

// =============================================================================
// ChatEvent
// =============================================================================

/// Closed set of events pushed by the chat server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatEvent {
    UserJoined(IdBody),
    UserLeft(IdBody),
    UserUpdated(IdBody),
    UserOnline(IdBody),
    UserOffline(IdBody),

    ChannelCreated(IdBody),
    ChannelUpdated(IdBody),
    ChannelDeleted(IdBody),
    ChannelStared(IdBody),
    ChannelUnstared(IdBody),
    ChannelViewersChanged(ChannelViewersBody),

    MessageCreated(IdBody),
    MessageUpdated(IdBody),
    MessageDeleted(IdBody),
    /// `id` is the channel whose messages were read
    MessageRead(IdBody),
    MessageStamped(MessageStampedBody),
    MessageUnstamped(MessageUnstampedBody),
    MessagePinned(MessagePinBody),
    MessageUnpinned(MessagePinBody),

    StampCreated(IdBody),
    StampDeleted(IdBody),

    ClipFolderCreated(IdBody),
    ClipFolderUpdated(IdBody),
    ClipFolderDeleted(IdBody),
    ClipFolderMessageAdded(ClipFolderMessageBody),
    ClipFolderMessageDeleted(ClipFolderMessageBody),
}

/// Fieldless tag of a [`ChatEvent`], used to subscribe listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    UserJoined,
    UserLeft,
    UserUpdated,
    UserOnline,
    UserOffline,
    ChannelCreated,
    ChannelUpdated,
    ChannelDeleted,
    ChannelStared,
    ChannelUnstared,
    ChannelViewersChanged,
    MessageCreated,
    MessageUpdated,
    MessageDeleted,
    MessageRead,
    MessageStamped,
    MessageUnstamped,
    MessagePinned,
    MessageUnpinned,
    StampCreated,
    StampDeleted,
    ClipFolderCreated,
    ClipFolderUpdated,
    ClipFolderDeleted,
    ClipFolderMessageAdded,
    ClipFolderMessageDeleted,
}

impl EventName {
    pub const ALL: &'static [EventName] = &[
        EventName::UserJoined,
        EventName::UserLeft,
        EventName::UserUpdated,
        EventName::UserOnline,
        EventName::UserOffline,
        EventName::ChannelCreated,
        EventName::ChannelUpdated,
        EventName::ChannelDeleted,
        EventName::ChannelStared,
        EventName::ChannelUnstared,
        EventName::ChannelViewersChanged,
        EventName::MessageCreated,
        EventName::MessageUpdated,
        EventName::MessageDeleted,
        EventName::MessageRead,
        EventName::MessageStamped,
        EventName::MessageUnstamped,
        EventName::MessagePinned,
        EventName::MessageUnpinned,
        EventName::StampCreated,
        EventName::StampDeleted,
        EventName::ClipFolderCreated,
        EventName::ClipFolderUpdated,
        EventName::ClipFolderDeleted,
        EventName::ClipFolderMessageAdded,
        EventName::ClipFolderMessageDeleted,
    ];

    /// Wire name, e.g. `MESSAGE_CREATED`
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::UserJoined => "USER_JOINED",
            EventName::UserLeft => "USER_LEFT",
            EventName::UserUpdated => "USER_UPDATED",
            EventName::UserOnline => "USER_ONLINE",
            EventName::UserOffline => "USER_OFFLINE",
            EventName::ChannelCreated => "CHANNEL_CREATED",
            EventName::ChannelUpdated => "CHANNEL_UPDATED",
            EventName::ChannelDeleted => "CHANNEL_DELETED",
            EventName::ChannelStared => "CHANNEL_STARED",
            EventName::ChannelUnstared => "CHANNEL_UNSTARED",
            EventName::ChannelViewersChanged => "CHANNEL_VIEWERS_CHANGED",
            EventName::MessageCreated => "MESSAGE_CREATED",
            EventName::MessageUpdated => "MESSAGE_UPDATED",
            EventName::MessageDeleted => "MESSAGE_DELETED",
            EventName::MessageRead => "MESSAGE_READ",
            EventName::MessageStamped => "MESSAGE_STAMPED",
            EventName::MessageUnstamped => "MESSAGE_UNSTAMPED",
            EventName::MessagePinned => "MESSAGE_PINNED",
            EventName::MessageUnpinned => "MESSAGE_UNPINNED",
            EventName::StampCreated => "STAMP_CREATED",
            EventName::StampDeleted => "STAMP_DELETED",
            EventName::ClipFolderCreated => "CLIP_FOLDER_CREATED",
            EventName::ClipFolderUpdated => "CLIP_FOLDER_UPDATED",
            EventName::ClipFolderDeleted => "CLIP_FOLDER_DELETED",
            EventName::ClipFolderMessageAdded => "CLIP_FOLDER_MESSAGE_ADDED",
            EventName::ClipFolderMessageDeleted => "CLIP_FOLDER_MESSAGE_DELETED",
        }
    }

    /// Look up a wire name
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|n| n.as_str() == name)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InboundEvent for ChatEvent {
    type Name = EventName;

    fn decode(message: &WsMessage) -> autosocket::Result<Self> {
        decode_json(message)
    }

    fn name(&self) -> EventName {
        match self {
            ChatEvent::UserJoined(_) => EventName::UserJoined,
            ChatEvent::UserLeft(_) => EventName::UserLeft,
            ChatEvent::UserUpdated(_) => EventName::UserUpdated,
            ChatEvent::UserOnline(_) => EventName::UserOnline,
            ChatEvent::UserOffline(_) => EventName::UserOffline,
            ChatEvent::ChannelCreated(_) => EventName::ChannelCreated,
            ChatEvent::ChannelUpdated(_) => EventName::ChannelUpdated,
            ChatEvent::ChannelDeleted(_) => EventName::ChannelDeleted,
            ChatEvent::ChannelStared(_) => EventName::ChannelStared,
            ChatEvent::ChannelUnstared(_) => EventName::ChannelUnstared,
            ChatEvent::ChannelViewersChanged(_) => EventName::ChannelViewersChanged,
            ChatEvent::MessageCreated(_) => EventName::MessageCreated,
            ChatEvent::MessageUpdated(_) => EventName::MessageUpdated,
            ChatEvent::MessageDeleted(_) => EventName::MessageDeleted,
            ChatEvent::MessageRead(_) => EventName::MessageRead,
            ChatEvent::MessageStamped(_) => EventName::MessageStamped,
            ChatEvent::MessageUnstamped(_) => EventName::MessageUnstamped,
            ChatEvent::MessagePinned(_) => EventName::MessagePinned,
            ChatEvent::MessageUnpinned(_) => EventName::MessageUnpinned,
            ChatEvent::StampCreated(_) => EventName::StampCreated,
            ChatEvent::StampDeleted(_) => EventName::StampDeleted,
            ChatEvent::ClipFolderCreated(_) => EventName::ClipFolderCreated,
            ChatEvent::ClipFolderUpdated(_) => EventName::ClipFolderUpdated,
            ChatEvent::ClipFolderDeleted(_) => EventName::ClipFolderDeleted,
            ChatEvent::ClipFolderMessageAdded(_) => EventName::ClipFolderMessageAdded,
            ChatEvent::ClipFolderMessageDeleted(_) => EventName::ClipFolderMessageDeleted,
        }
    }
}
