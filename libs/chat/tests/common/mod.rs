//! Common test utilities for chat integration tests

#![allow(dead_code)]

use chat::SocketConfig;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::tungstenite::Message;

/// Chat server stand-in: records commands, pushes events to every client
pub struct MockChatServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    received: Arc<Mutex<Vec<String>>>,
    push_tx: broadcast::Sender<String>,
}

impl MockChatServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let (push_tx, _) = broadcast::channel(64);

        let shutdown_clone = shutdown.clone();
        let received_clone = received.clone();
        let push_clone = push_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { break };
                        let received = received_clone.clone();
                        let pushes = push_clone.subscribe();
                        let shutdown = shutdown_clone.clone();
                        tokio::spawn(Self::handle_connection(stream, received, pushes, shutdown));
                    }
                    _ = shutdown_clone.notified() => break,
                }
            }
        });

        Self {
            addr,
            shutdown,
            received,
            push_tx,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        received: Arc<Mutex<Vec<String>>>,
        mut pushes: broadcast::Receiver<String>,
        shutdown: Arc<Notify>,
    ) {
        let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        let (mut write, mut read) = ws.split();

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => received.lock().push(text),
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                push = pushes.recv() => match push {
                    Ok(text) => {
                        if write.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                _ = shutdown.notified() => break,
            }
        }
    }

    /// Config pointing at this server through a relative endpoint
    pub fn config(&self) -> SocketConfig {
        let mut config = SocketConfig {
            base_url: format!("http://{}/", self.addr),
            endpoint: "/api/v3/ws".to_string(),
            ..SocketConfig::default()
        };
        config.reconnect.min_delay_ms = 20;
        config.reconnect.max_delay_ms = 80;
        config.reconnect.connection_timeout_ms = 500;
        config
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Push a frame to every connected client
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.push_tx.send(frame.into());
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.shutdown.notify_waiters();
    }
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
