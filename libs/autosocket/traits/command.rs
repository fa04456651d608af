//! Outbound command kinds and wire encoding
//!
//! Commands travel as a single text frame `kind:arg1:arg2:...`.
//! Arguments are not escaped, so an argument containing the delimiter
//! is rejected before it reaches the queue.

use crate::error::{Result, SocketError};
use crate::parser::WsMessage;
use std::fmt::Debug;
use std::hash::Hash;

/// Separator between the kind tag and each argument
pub const COMMAND_DELIMITER: char = ':';

/// A closed set of outbound command kinds
///
/// Implemented by a fieldless enum. The `Ord` implementation decides the
/// order in which pending commands are flushed after a reconnection, so
/// deriving it gives declaration order.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// enum Cmd {
///     ViewState,
///     TimelineStreaming,
/// }
///
/// impl CommandKind for Cmd {
///     const ALL: &'static [Self] = &[Cmd::ViewState, Cmd::TimelineStreaming];
///
///     fn as_str(&self) -> &'static str {
///         match self {
///             Cmd::ViewState => "viewstate",
///             Cmd::TimelineStreaming => "timeline_streaming",
///         }
///     }
/// }
/// ```
pub trait CommandKind: Copy + Ord + Hash + Debug + Send + Sync + 'static {
    /// Every member of the closed set
    const ALL: &'static [Self];

    /// Wire tag for this kind
    fn as_str(&self) -> &'static str;

    /// Look up a kind by its wire tag
    ///
    /// Tags outside the closed set are a programming error and yield
    /// [`SocketError::UnknownCommand`].
    fn parse(tag: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| SocketError::UnknownCommand(tag.to_string()))
    }
}

/// A command kind together with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<K: CommandKind> {
    pub kind: K,
    pub args: Vec<String>,
}

impl<K: CommandKind> Command<K> {
    /// Build a command, rejecting arguments that contain the delimiter
    pub fn new<I, S>(kind: K, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        if let Some(bad) = args.iter().find(|arg| arg.contains(COMMAND_DELIMITER)) {
            return Err(SocketError::InvalidCommand(format!(
                "argument {:?} of {} contains '{}'",
                bad,
                kind.as_str(),
                COMMAND_DELIMITER
            )));
        }

        Ok(Self { kind, args })
    }

    /// Serialize to the wire format
    pub fn encode(&self) -> String {
        let mut frame = String::from(self.kind.as_str());
        for arg in &self.args {
            frame.push(COMMAND_DELIMITER);
            frame.push_str(arg);
        }
        frame
    }

    /// Serialize into a text frame
    pub fn to_message(&self) -> WsMessage {
        WsMessage::Text(self.encode())
    }
}
