use crate::error::{Result, SocketError};
use crate::parser::WsMessage;
use async_trait::async_trait;
use futures::{Sink, Stream};
use std::pin::Pin;

/// Outbound half of an established connection
pub type FrameSink = Pin<Box<dyn Sink<WsMessage, Error = SocketError> + Send>>;

/// Inbound half of an established connection
///
/// The stream ending (`None`) or yielding an error means the connection
/// is gone.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<WsMessage>> + Send>>;

/// One established connection, split into its two halves
///
/// Owned exclusively by the client task. A new `Connection` is produced
/// for every (re)connection attempt; old ones are dropped, never reused.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

/// Trait for opening the underlying socket
///
/// Implement this to run the client over something other than
/// `tokio-tungstenite`, e.g. an in-memory transport in tests.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a fresh connection
    ///
    /// Called once by `connect()` and once per reconnection attempt.
    /// The caller bounds this with the configured connection timeout.
    async fn open(&self) -> Result<Connection>;

    /// Human readable endpoint, used in logs
    fn endpoint(&self) -> &str;
}
