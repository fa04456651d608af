//! WebSocket endpoint derivation
//!
//! The configured endpoint may be absolute or relative to the base URL the
//! application is served from. The socket scheme follows the base: `wss`
//! behind `https`, `ws` otherwise.

use crate::infrastructure::config::{ConfigError, Result};
use url::Url;

/// Resolve `endpoint` against `base_url` and pick the socket scheme
pub fn resolve_endpoint(endpoint: &str, base_url: &str) -> Result<Url> {
    let base = Url::parse(base_url)?;
    let mut url = base.join(endpoint)?;

    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme).map_err(|_| {
        ConfigError::ValidationError(format!(
            "cannot use {} as a WebSocket endpoint",
            url
        ))
    })?;

    Ok(url)
}
