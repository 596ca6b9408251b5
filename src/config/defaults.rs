//! Default value functions for configuration fields.
//!
//! This module contains all the default value functions used by serde's `#[serde(default = ...)]`
//! attributes throughout the configuration system. Functions are organized by category for
//! easier maintenance.

use super::logging::LogFormat;

// =============================================================================
// Port & Root Config
// =============================================================================

pub const fn default_port() -> u16 {
    3536
}

// =============================================================================
// Server / Room Defaults
// =============================================================================

pub const fn default_max_rooms_per_game() -> usize {
    1000
}

pub const fn default_finished_eviction_secs() -> u64 {
    5
}

pub const fn default_empty_room_eviction_secs() -> u64 {
    60
}

pub const fn default_reconnect_grace_secs() -> u64 {
    30
}

pub const fn default_event_buffer_size() -> usize {
    100
}

pub const fn default_enable_reconnection() -> bool {
    true
}

pub const fn default_heartbeat_throttle_secs() -> u64 {
    30
}

pub fn default_region_id() -> String {
    "default".to_string()
}

pub const fn default_tournament_autostart_min_delay_secs() -> u64 {
    1
}

pub const fn default_tournament_autostart_max_delay_secs() -> u64 {
    10
}

// =============================================================================
// Ludo Rule Engine Defaults
// =============================================================================

pub const fn default_turn_seconds() -> u32 {
    30
}

pub const fn default_max_inactive_turns() -> u8 {
    5
}

pub const fn default_roll_resolution_delay_ms() -> u64 {
    500
}

pub const fn default_penalty_display_delay_ms() -> u64 {
    1500
}

pub const fn default_broadcast_tick_secs() -> u64 {
    5
}

pub const fn default_enable_pity_six() -> bool {
    true
}

pub const fn default_enable_three_sixes_penalty() -> bool {
    true
}

pub const fn default_allow_manual_rooms() -> bool {
    true
}

// =============================================================================
// Rate Limit Defaults
// =============================================================================

pub const fn default_max_room_creations() -> u32 {
    5
}

pub const fn default_rate_limit_time_window() -> u64 {
    60
}

pub const fn default_max_join_attempts() -> u32 {
    20
}

// =============================================================================
// Protocol Defaults
// =============================================================================

pub const fn default_max_game_code_length() -> usize {
    8
}

pub const fn default_min_game_code_length() -> usize {
    4
}

pub const fn default_max_player_name_length() -> usize {
    32
}

pub const fn default_max_players_limit() -> u8 {
    4
}

// =============================================================================
// Player Name Validation Defaults
// =============================================================================

pub const fn default_allow_unicode_player_names() -> bool {
    true
}

pub const fn default_allow_spaces_in_player_names() -> bool {
    true
}

pub const fn default_allow_leading_trailing_whitespace() -> bool {
    false
}

pub fn default_allowed_player_name_symbols() -> Vec<char> {
    vec!['-', '_']
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    true
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

// =============================================================================
// Security Defaults
// =============================================================================

pub fn default_cors_origins() -> String {
    "http://localhost:3000,http://localhost:5173".to_string()
}

pub const fn default_require_auth() -> bool {
    true
}

pub const fn default_max_message_size() -> usize {
    65536 // 64KB
}

pub const fn default_max_connections_per_ip() -> usize {
    10
}

// =============================================================================
// Auth Maintenance Defaults
// =============================================================================

pub const fn default_identity_timeout_secs() -> u64 {
    5
}

// =============================================================================
// WebSocket Defaults
// =============================================================================

pub const fn default_auth_timeout_secs() -> u64 {
    10
}

// =============================================================================
// Metrics Defaults
// =============================================================================

pub const fn default_require_metrics_auth() -> bool {
    true
}
