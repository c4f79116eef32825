use std::net::SocketAddr;

use serde::Deserialize;

/// Listener for one emulated dialect (LM Studio or Ollama)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DialectServerConfig {
    /// Whether this dialect is served at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Bind address; each dialect falls back to its conventional port
    pub listen_address: Option<SocketAddr>,
    /// Path prefix under which the dialect routes are mounted
    #[serde(default)]
    pub path: String,
}

impl Default for DialectServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: None,
            path: String::new(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}
