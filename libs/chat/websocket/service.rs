//! Chat socket service
//!
//! One [`ChatSocket`] is created at startup and shared (by reference or
//! `Arc`) with everything that talks to the chat server.

use super::commands::{self, ChannelViewState, ChatCommand};
use super::events::{ChatEvent, EventName};
use crate::infrastructure::config::{ConfigError, SocketConfig};
use autosocket::{
    AutoSocket, ClientEvent, ConnectionState, ListenerId, Metrics, SocketError, Topic,
};
use crossbeam_channel::Receiver;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Client specialised to the chat protocol
pub type ChatClient = AutoSocket<ChatCommand, ChatEvent>;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Socket error: {0}")]
    Socket(#[from] SocketError),
}

pub type Result<T> = std::result::Result<T, ChatError>;

/// Connection to the chat server
pub struct ChatSocket {
    client: ChatClient,
}

impl ChatSocket {
    /// Build the socket from configuration
    ///
    /// Must be called inside a tokio runtime. The socket stays
    /// disconnected until [`ChatSocket::setup`].
    pub fn from_config(config: &SocketConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Like [`ChatSocket::from_config`], stopping when `shutdown_flag` turns false
    pub fn with_shutdown_flag(
        config: &SocketConfig,
        shutdown_flag: Arc<AtomicBool>,
    ) -> Result<Self> {
        Self::build(config, Some(shutdown_flag))
    }

    fn build(config: &SocketConfig, shutdown_flag: Option<Arc<AtomicBool>>) -> Result<Self> {
        let url = config.endpoint_url()?;
        let options = config.reconnect.to_options();
        info!("Chat socket endpoint: {}", url);

        let mut builder = autosocket::builder::<ChatCommand, ChatEvent>()
            .url(url.as_str())
            .protocols(config.protocols.iter().cloned())
            .reconnect_options(options);

        if let Some(flag) = shutdown_flag {
            builder = builder.shutdown_flag(flag);
        }

        Ok(Self::from_client(builder.build()?))
    }

    /// Wrap an already built client, e.g. one with a custom transport
    pub fn from_client(client: ChatClient) -> Self {
        Self { client }
    }

    /// Start connecting; commands sent before this are queued
    pub fn setup(&self) -> Result<()> {
        Ok(self.client.connect()?)
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    pub fn send_view_state(&self, channel_id: &str, state: ChannelViewState) -> Result<()> {
        let command = commands::view_state(channel_id, state)?;
        Ok(self.client.send(command)?)
    }

    pub fn send_rtc_state(&self, channel_id: &str, state: &str, session_id: &str) -> Result<()> {
        let command = commands::rtc_state(channel_id, state, session_id)?;
        Ok(self.client.send(command)?)
    }

    pub fn set_timeline_streaming(&self, on: bool) -> Result<()> {
        Ok(self.client.send(commands::timeline_streaming(on))?)
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Subscribe to one event name
    pub fn on<F>(&self, name: EventName, handler: F) -> ListenerId
    where
        F: Fn(&ChatEvent) -> autosocket::Result<()> + Send + Sync + 'static,
    {
        self.client.on(Topic::Event(name), handler)
    }

    /// Subscribe to every event
    pub fn on_all<F>(&self, handler: F) -> ListenerId
    where
        F: Fn(&ChatEvent) -> autosocket::Result<()> + Send + Sync + 'static,
    {
        self.client.on(Topic::All, handler)
    }

    /// Remove a listener added with [`ChatSocket::on`]
    pub fn off(&self, name: EventName, id: ListenerId) -> bool {
        self.client.off(Topic::Event(name), id)
    }

    /// Remove a listener added with [`ChatSocket::on_all`]
    pub fn off_all(&self, id: ListenerId) -> bool {
        self.client.off(Topic::All, id)
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn is_open(&self) -> bool {
        self.client.is_open()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.client.connection_state()
    }

    pub fn metrics(&self) -> Metrics {
        self.client.metrics()
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    /// Lifecycle events (`Connected`, `Reconnected`, ...)
    pub fn events(&self) -> Receiver<ClientEvent> {
        self.client.events()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        self.client.recv_event_timeout(timeout)
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    #[cfg(debug_assertions)]
    pub fn debug_hooks(&self) -> super::debug::ChatDebugHooks {
        super::debug::ChatDebugHooks::new(self.client.debug_hooks())
    }

    /// Close the connection for good
    pub async fn shutdown(self) -> Result<()> {
        Ok(self.client.shutdown().await?)
    }
}
