//! Common test utilities for AutoSocket integration tests
//!
//! - [`MockWsServer`]: a real WebSocket server on localhost that records
//!   inbound frames and can push frames or drop every connection
//! - [`ScriptedTransport`]: an in-memory transport whose connection
//!   attempts succeed or fail on demand
//! - [`TestCommand`] / [`TestEvent`]: small closed sets for the client

#![allow(dead_code)]

use async_trait::async_trait;
use autosocket::{
    decode_json, CommandKind, Connection, InboundEvent, Result, SocketError, Transport, WsMessage,
};
use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};

// =============================================================================
// Closed sets used by the tests
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestCommand {
    Join,
    Read,
}

impl CommandKind for TestCommand {
    const ALL: &'static [Self] = &[TestCommand::Join, TestCommand::Read];

    fn as_str(&self) -> &'static str {
        match self {
            TestCommand::Join => "join",
            TestCommand::Read => "read",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestEventName {
    Added,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestEvent {
    Added { id: String },
    Deleted { id: String },
}

impl InboundEvent for TestEvent {
    type Name = TestEventName;

    fn decode(message: &WsMessage) -> Result<Self> {
        decode_json(message)
    }

    fn name(&self) -> TestEventName {
        match self {
            TestEvent::Added { .. } => TestEventName::Added,
            TestEvent::Deleted { .. } => TestEventName::Deleted,
        }
    }
}

pub fn added_frame(id: &str) -> String {
    format!(r#"{{"type":"ADDED","body":{{"id":"{}"}}}}"#, id)
}

pub fn deleted_frame(id: &str) -> String {
    format!(r#"{{"type":"DELETED","body":{{"id":"{}"}}}}"#, id)
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

// =============================================================================
// Mock WebSocket server
// =============================================================================

enum ServerAction {
    Push(String),
    Drop,
}

/// A simple mock WebSocket server for testing
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<Mutex<Vec<mpsc::UnboundedSender<ServerAction>>>>,
    accepted: Arc<AtomicUsize>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let shutdown_clone = shutdown.clone();
        let received_clone = received.clone();
        let connections_clone = connections.clone();
        let accepted_clone = accepted.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let (tx, rx) = mpsc::unbounded_channel();
                                connections_clone.lock().push(tx);
                                accepted_clone.fetch_add(1, Ordering::SeqCst);
                                let received = received_clone.clone();
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, received, rx, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            received,
            connections,
            accepted,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        received: Arc<Mutex<Vec<String>>>,
        mut actions: mpsc::UnboundedReceiver<ServerAction>,
        shutdown: Arc<Notify>,
    ) {
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => received.lock().push(text),
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                action = actions.recv() => {
                    match action {
                        Some(ServerAction::Push(text)) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Some(ServerAction::Drop) | None => break,
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Text frames received from clients so far
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Number of handshakes accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Send a text frame to every live connection
    pub fn push(&self, text: impl Into<String>) {
        let text = text.into();
        self.connections
            .lock()
            .retain(|tx| tx.send(ServerAction::Push(text.clone())).is_ok());
    }

    /// Abruptly end every live connection
    pub fn drop_connections(&self) {
        for tx in self.connections.lock().drain(..) {
            let _ = tx.send(ServerAction::Drop);
        }
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Scripted in-memory transport
// =============================================================================

/// Server side of one in-memory connection
pub struct ServerEnd {
    /// Frames the client sent
    pub outbound: fmpsc::UnboundedReceiver<WsMessage>,
    /// Push frames to the client; dropping it closes the connection
    pub inbound: Option<fmpsc::UnboundedSender<Result<WsMessage>>>,
}

impl ServerEnd {
    pub fn push(&self, text: &str) {
        if let Some(tx) = &self.inbound {
            let _ = tx.unbounded_send(Ok(WsMessage::Text(text.to_string())));
        }
    }

    /// Close the connection from the server side
    pub fn close(&mut self) {
        self.inbound = None;
    }

    /// Frames the client has sent so far, without waiting
    pub fn drain_sent(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(Some(msg)) = self.outbound.try_next() {
            if let WsMessage::Text(text) = msg {
                frames.push(text);
            }
        }
        frames
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Outcome {
    Open,
    Fail,
}

/// Transport whose attempts follow a script
///
/// Once the script runs out every further attempt opens.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    attempts: Arc<AtomicUsize>,
    servers: Arc<Mutex<Vec<ServerEnd>>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            attempts: Arc::new(AtomicUsize::new(0)),
            servers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always_open() -> Self {
        Self::new([])
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.servers.lock().len()
    }

    /// Run `f` on the server end of the `index`th opened connection
    pub fn with_server<R>(&self, index: usize, f: impl FnOnce(&mut ServerEnd) -> R) -> R {
        let mut servers = self.servers.lock();
        f(&mut servers[index])
    }

    /// Server end of the most recent connection
    pub fn with_latest<R>(&self, f: impl FnOnce(&mut ServerEnd) -> R) -> R {
        let mut servers = self.servers.lock();
        let last = servers.len() - 1;
        f(&mut servers[last])
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self) -> Result<Connection> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let outcome = self.script.lock().pop_front().unwrap_or(Outcome::Open);
        if let Outcome::Fail = outcome {
            return Err(SocketError::WebSocket("scripted failure".into()));
        }

        let (out_tx, out_rx) = fmpsc::unbounded::<WsMessage>();
        let (in_tx, in_rx) = fmpsc::unbounded::<Result<WsMessage>>();

        self.servers.lock().push(ServerEnd {
            outbound: out_rx,
            inbound: Some(in_tx),
        });

        let sink = out_tx.sink_map_err(|e| SocketError::ChannelSend(e.to_string()));
        Ok(Connection::new(Box::pin(sink), Box::pin(in_rx)))
    }

    fn endpoint(&self) -> &str {
        "memory://scripted"
    }
}
