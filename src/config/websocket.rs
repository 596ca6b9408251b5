//! WebSocket configuration types.

use super::defaults::{default_auth_timeout_secs, default_max_message_size};
use serde::{Deserialize, Serialize};

/// WebSocket configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebSocketConfig {
    /// Authentication timeout in seconds (time allowed for clients to authenticate)
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
    /// Maximum size in bytes of an inbound text frame.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            auth_timeout_secs: default_auth_timeout_secs(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl WebSocketConfig {
    /// Validate WebSocket configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth_timeout_secs < 5 {
            anyhow::bail!(
                "websocket.auth_timeout_secs must be at least 5 seconds (configured: {})",
                self.auth_timeout_secs
            );
        }
        if self.auth_timeout_secs > 60 {
            anyhow::bail!(
                "websocket.auth_timeout_secs must not exceed 60 seconds (configured: {})",
                self.auth_timeout_secs
            );
        }
        if self.max_message_size == 0 {
            anyhow::bail!("websocket.max_message_size must be greater than zero");
        }
        Ok(())
    }
}
