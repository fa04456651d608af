//! Chat Client - Main Library
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI)
//! - **chat**: Chat protocol, configuration and logging (re-exported from workspace)
//! - **autosocket**: Self-healing WebSocket library (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use chat_client::bin_common::{load_config_from_env, ConfigType};
//! use chat_client::chat::{ChatSocket, SocketConfig};
//! ```

// Re-export workspace libraries for convenience
pub use autosocket;
pub use chat;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
}
