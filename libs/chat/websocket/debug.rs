//! Debug-only connection controls
//!
//! Lets a developer take the socket offline and bring it back by hand, to
//! exercise offline queueing without touching the network. Only compiled
//! with `debug_assertions`.

use super::commands::ChatCommand;
use autosocket::DebugHooks;
use tracing::info;

/// Manual controls over the live socket
#[derive(Clone)]
pub struct ChatDebugHooks {
    hooks: DebugHooks<ChatCommand>,
}

/// Console actions understood by [`ChatDebugHooks::run_action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugAction {
    /// Close the socket and keep every reconnection attempt failing
    Close,
    /// Lift the failure and reconnect immediately
    Reconnect,
}

impl DebugAction {
    /// Parse a console line such as `close` or `reconnect`
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "close" | "closews" => Some(DebugAction::Close),
            "reconnect" | "reconnectws" => Some(DebugAction::Reconnect),
            _ => None,
        }
    }
}

impl ChatDebugHooks {
    pub(crate) fn new(hooks: DebugHooks<ChatCommand>) -> Self {
        Self { hooks }
    }

    /// Drop the connection and fail every attempt until [`Self::reconnect`]
    pub fn close_connection(&self) -> autosocket::Result<()> {
        info!("[debug] Closing socket, reconnection will fail until reconnect");
        self.hooks.close_connection()
    }

    /// Clear injected failures and connect right away
    pub fn reconnect(&self) -> autosocket::Result<()> {
        info!("[debug] Reconnecting socket");
        self.hooks.reconnect()
    }

    pub fn run_action(&self, action: DebugAction) -> autosocket::Result<()> {
        match action {
            DebugAction::Close => self.close_connection(),
            DebugAction::Reconnect => self.reconnect(),
        }
    }
}
