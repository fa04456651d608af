//! Outbound chat commands
//!
//! Every command travels as one text frame `kind:arg1:arg2:...`. While the
//! socket is down only the latest command of each kind is kept.

use autosocket::{Command, CommandKind};
use std::fmt;

/// Closed set of command kinds understood by the chat server
///
/// Declaration order is the flush order after a reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChatCommand {
    /// Which channel the user is looking at, and how
    ViewState,
    /// Voice/video session state for a channel
    RtcState,
    /// Subscribe to or leave the global message timeline
    TimelineStreaming,
}

impl CommandKind for ChatCommand {
    const ALL: &'static [Self] = &[
        ChatCommand::ViewState,
        ChatCommand::RtcState,
        ChatCommand::TimelineStreaming,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ChatCommand::ViewState => "viewstate",
            ChatCommand::RtcState => "rtcstate",
            ChatCommand::TimelineStreaming => "timeline_streaming",
        }
    }
}

impl fmt::Display for ChatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the user is viewing a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelViewState {
    None,
    Monitoring,
    Editing,
}

impl ChannelViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelViewState::None => "none",
            ChannelViewState::Monitoring => "monitoring",
            ChannelViewState::Editing => "editing",
        }
    }
}

impl fmt::Display for ChannelViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `viewstate:<channel>:<state>`
pub fn view_state(
    channel_id: &str,
    state: ChannelViewState,
) -> autosocket::Result<Command<ChatCommand>> {
    Command::new(ChatCommand::ViewState, [channel_id, state.as_str()])
}

/// `rtcstate:<channel>:<state>:<session>`
pub fn rtc_state(
    channel_id: &str,
    state: &str,
    session_id: &str,
) -> autosocket::Result<Command<ChatCommand>> {
    Command::new(ChatCommand::RtcState, [channel_id, state, session_id])
}

/// `timeline_streaming:on` or `timeline_streaming:off`
pub fn timeline_streaming(on: bool) -> Command<ChatCommand> {
    Command {
        kind: ChatCommand::TimelineStreaming,
        args: vec![if on { "on" } else { "off" }.to_string()],
    }
}
