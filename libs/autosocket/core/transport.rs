//! `tokio-tungstenite` transport

use crate::traits::*;
use async_trait::async_trait;
use futures::{future, SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

/// WebSocket transport backed by `tokio-tungstenite`
///
/// Every call to [`Transport::open`] performs a fresh handshake against
/// the same URL.
#[derive(Debug, Clone)]
pub struct TungsteniteTransport {
    url: String,
    protocols: Vec<String>,
}

impl TungsteniteTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            protocols: Vec::new(),
        }
    }

    /// Sub-protocols offered in the `Sec-WebSocket-Protocol` header
    pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn open(&self) -> Result<Connection> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| SocketError::Configuration(format!("Invalid URL {}: {}", self.url, e)))?;

        if !self.protocols.is_empty() {
            let value = http::header::HeaderValue::from_str(&self.protocols.join(", "))
                .map_err(|e| SocketError::Configuration(format!("Invalid sub-protocol: {}", e)))?;
            request
                .headers_mut()
                .insert(http::header::SEC_WEBSOCKET_PROTOCOL, value);
            debug!("Offering sub-protocols {:?}", self.protocols);
        }

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| SocketError::WebSocket(e.to_string()))?;

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(|e| SocketError::WebSocket(e.to_string()))
            .with(|msg: WsMessage| {
                future::ready(Ok::<_, SocketError>(ws_message_to_tungstenite(msg)))
            });

        let stream = read.filter_map(|frame| {
            future::ready(match frame {
                Ok(msg) => tungstenite_to_ws_message(msg).map(Ok),
                Err(e) => Some(Err(SocketError::WebSocket(e.to_string()))),
            })
        });

        Ok(Connection::new(Box::pin(sink), Box::pin(stream)))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Convert WsMessage to tungstenite Message
fn ws_message_to_tungstenite(msg: WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text),
        WsMessage::Binary(data) => Message::Binary(data),
    }
}

/// Convert tungstenite Message to WsMessage
///
/// Control frames are answered by tungstenite itself and never surface.
fn tungstenite_to_ws_message(msg: Message) -> Option<WsMessage> {
    match msg {
        Message::Text(text) => Some(WsMessage::Text(text)),
        Message::Binary(data) => Some(WsMessage::Binary(data)),
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
    }
}
