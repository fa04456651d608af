//! Infrastructure Layer
//!
//! Configuration loading and logging setup.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ReconnectConfig, SocketConfig};
pub use logging::init_tracing;
