use thiserror::Error;

/// Main error type for autosocket
#[derive(Error, Debug)]
pub enum SocketError {
    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed unexpectedly
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Connection establishment did not finish in time
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Inbound frame could not be decoded into a known event
    #[error("Decode error: {0}")]
    Decode(String),

    /// Command violates the wire format (argument contains the delimiter)
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Command kind outside the closed set
    #[error("Unknown command kind: {0}")]
    UnknownCommand(String),

    /// Channel send error (client task is gone)
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Listener returned an error
    #[error("Handler error: {0}")]
    Handler(String),
}

/// Result type for autosocket operations
pub type Result<T> = std::result::Result<T, SocketError>;
