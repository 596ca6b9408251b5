//! Security and authentication configuration types.

use super::defaults::{
    default_cors_origins, default_identity_timeout_secs, default_max_connections_per_ip,
    default_max_message_size, default_require_auth,
};
use serde::{Deserialize, Serialize};

/// Security configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Allowed CORS origins (comma-separated, or "*" for any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// Enable authentication for WebSocket connections
    #[serde(default = "default_require_auth")]
    pub require_websocket_auth: bool,
    /// Enable authentication for the metrics endpoint
    #[serde(default = "default_require_auth")]
    pub require_metrics_auth: bool,
    /// Authentication token for the metrics endpoint (if required)
    #[serde(default)]
    pub metrics_auth_token: Option<String>,
    /// Maximum WebSocket message size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Maximum connections per IP address
    #[serde(default = "default_max_connections_per_ip")]
    pub max_connections_per_ip: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            require_websocket_auth: default_require_auth(),
            require_metrics_auth: default_require_auth(),
            metrics_auth_token: None,
            max_message_size: default_max_message_size(),
            max_connections_per_ip: default_max_connections_per_ip(),
        }
    }
}

/// Auth maintenance configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthMaintenanceConfig {
    /// Timeout for a connection to complete AUTH before it is dropped (seconds).
    #[serde(default = "default_identity_timeout_secs")]
    pub identity_timeout_secs: u64,
}

impl Default for AuthMaintenanceConfig {
    fn default() -> Self {
        Self {
            identity_timeout_secs: default_identity_timeout_secs(),
        }
    }
}
