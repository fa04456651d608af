//! Pending outbound commands
//!
//! Holds at most one entry per command kind: a newer command of the same
//! kind replaces the older one. Drained in kind order when the connection
//! (re)opens.

use crate::traits::{Command, CommandKind};
use std::collections::BTreeMap;

/// Latest-per-kind buffer of commands issued while disconnected
#[derive(Debug)]
pub struct CommandQueue<K: CommandKind> {
    pending: BTreeMap<K, Vec<String>>,
}

impl<K: CommandKind> Default for CommandQueue<K> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
        }
    }
}

impl<K: CommandKind> CommandQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a command, superseding any pending command of the same kind
    ///
    /// Returns the superseded arguments, if any.
    pub fn push(&mut self, command: Command<K>) -> Option<Vec<String>> {
        self.pending.insert(command.kind, command.args)
    }

    /// Take every pending command in kind order, leaving the queue empty
    pub fn drain(&mut self) -> Vec<Command<K>> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(kind, args)| Command { kind, args })
            .collect()
    }

    /// Put back commands that could not be transmitted
    ///
    /// A command pushed after the drain is newer and wins over the
    /// restored one.
    pub fn restore(&mut self, commands: impl IntoIterator<Item = Command<K>>) {
        for command in commands {
            self.pending.entry(command.kind).or_insert(command.args);
        }
    }

    pub fn get(&self, kind: K) -> Option<&[String]> {
        self.pending.get(&kind).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
