//! Root configuration types.

use super::defaults::default_port;
use super::logging::LoggingConfig;
use super::protocol::ProtocolConfig;
use super::security::{AuthMaintenanceConfig, SecurityConfig};
use super::server::{RateLimitConfig, ServerConfig};
use super::websocket::WebSocketConfig;
use serde::{Deserialize, Serialize};

/// Root configuration struct.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub auth: AuthMaintenanceConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            protocol: ProtocolConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
            auth: AuthMaintenanceConfig::default(),
            websocket: WebSocketConfig::default(),
        }
    }
}
