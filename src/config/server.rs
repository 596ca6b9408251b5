//! Server / room-lifecycle configuration types.

use super::defaults::{
    default_allow_manual_rooms, default_broadcast_tick_secs, default_empty_room_eviction_secs,
    default_enable_pity_six, default_enable_reconnection, default_enable_three_sixes_penalty,
    default_event_buffer_size, default_finished_eviction_secs, default_heartbeat_throttle_secs,
    default_max_inactive_turns, default_max_join_attempts, default_max_room_creations,
    default_max_rooms_per_game, default_penalty_display_delay_ms, default_rate_limit_time_window,
    default_reconnect_grace_secs, default_region_id, default_roll_resolution_delay_ms,
    default_tournament_autostart_max_delay_secs, default_tournament_autostart_min_delay_secs,
    default_turn_seconds,
};
use serde::{Deserialize, Serialize};

/// Server configuration for room lifecycle and turn timing.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Seconds a seat has to act before `handle_missed_turn` fires.
    #[serde(default = "default_turn_seconds")]
    pub turn_seconds: u32,
    /// Consecutive missed turns before a seat is forfeited.
    #[serde(default = "default_max_inactive_turns")]
    pub max_inactive_turns: u8,
    /// Delay between `initiateRoll` and `completeRoll` (milliseconds).
    #[serde(default = "default_roll_resolution_delay_ms")]
    pub roll_resolution_delay_ms: u64,
    /// Extra delay after a no-move / three-sixes outcome before the seat advances (milliseconds).
    #[serde(default = "default_penalty_display_delay_ms")]
    pub penalty_display_delay_ms: u64,
    /// Cadence of broadcasts while only the turn timer is ticking (seconds).
    #[serde(default = "default_broadcast_tick_secs")]
    pub broadcast_tick_secs: u64,
    /// Enable the pity-six rule.
    #[serde(default = "default_enable_pity_six")]
    pub enable_pity_six: bool,
    /// Enable the three-consecutive-sixes forfeiture rule.
    #[serde(default = "default_enable_three_sixes_penalty")]
    pub enable_three_sixes_penalty: bool,
    /// Allow ad-hoc manual rooms for codes with no matching tournament row.
    #[serde(default = "default_allow_manual_rooms")]
    pub allow_manual_rooms: bool,
    /// Maximum number of rooms per distinct game code namespace.
    #[serde(default = "default_max_rooms_per_game")]
    pub max_rooms_per_game: usize,
    /// Grace period after the game finishes before the room is evicted (seconds).
    #[serde(default = "default_finished_eviction_secs")]
    pub finished_eviction_secs: u64,
    /// Grace period after the last peer leaves a pre-Finished room (seconds).
    #[serde(default = "default_empty_room_eviction_secs")]
    pub empty_room_eviction_secs: u64,
    /// Reconnect grace window for a disconnected (not yet removed) player (seconds).
    #[serde(default = "default_reconnect_grace_secs")]
    pub reconnect_grace_secs: u64,
    /// Number of missed-event entries retained per room for reconnect catch-up.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
    /// Enable the reconnect-wins-race grace period at all.
    #[serde(default = "default_enable_reconnection")]
    pub enable_reconnection: bool,
    /// Minimum autostart delay for tournament rooms once full (seconds).
    #[serde(default = "default_tournament_autostart_min_delay_secs")]
    pub tournament_autostart_min_delay_secs: u64,
    /// Maximum autostart delay for tournament rooms once full (seconds).
    #[serde(default = "default_tournament_autostart_max_delay_secs")]
    pub tournament_autostart_max_delay_secs: u64,
    /// Heartbeat throttle: minimum time between `last_seen` updates (seconds).
    #[serde(default = "default_heartbeat_throttle_secs")]
    pub heartbeat_throttle_secs: u64,
    /// Identifier for the deployment region.
    #[serde(default = "default_region_id")]
    pub region_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            turn_seconds: default_turn_seconds(),
            max_inactive_turns: default_max_inactive_turns(),
            roll_resolution_delay_ms: default_roll_resolution_delay_ms(),
            penalty_display_delay_ms: default_penalty_display_delay_ms(),
            broadcast_tick_secs: default_broadcast_tick_secs(),
            enable_pity_six: default_enable_pity_six(),
            enable_three_sixes_penalty: default_enable_three_sixes_penalty(),
            allow_manual_rooms: default_allow_manual_rooms(),
            max_rooms_per_game: default_max_rooms_per_game(),
            finished_eviction_secs: default_finished_eviction_secs(),
            empty_room_eviction_secs: default_empty_room_eviction_secs(),
            reconnect_grace_secs: default_reconnect_grace_secs(),
            event_buffer_size: default_event_buffer_size(),
            enable_reconnection: default_enable_reconnection(),
            tournament_autostart_min_delay_secs: default_tournament_autostart_min_delay_secs(),
            tournament_autostart_max_delay_secs: default_tournament_autostart_max_delay_secs(),
            heartbeat_throttle_secs: default_heartbeat_throttle_secs(),
            region_id: default_region_id(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    /// Maximum number of room creation requests per time window.
    #[serde(default = "default_max_room_creations")]
    pub max_room_creations: u32,
    /// Time window for rate limiting (seconds).
    #[serde(default = "default_rate_limit_time_window")]
    pub time_window: u64,
    /// Maximum number of join attempts per time window.
    #[serde(default = "default_max_join_attempts")]
    pub max_join_attempts: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_room_creations: default_max_room_creations(),
            time_window: default_rate_limit_time_window(),
            max_join_attempts: default_max_join_attempts(),
        }
    }
}
