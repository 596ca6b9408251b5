//! Sliding-window rate limiting for room creation and join attempts, keyed by
//! caller (IP address before auth, player id after).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use crate::config::server::RateLimitConfig;

#[derive(Debug, Clone)]
struct RateLimitEntry {
    room_creations: u32,
    join_attempts: u32,
    window_start: Instant,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            room_creations: 0,
            join_attempts: 0,
            window_start: Instant::now(),
        }
    }

    fn maybe_reset_window(&mut self, window: Duration) {
        if self.window_start.elapsed() >= window {
            self.room_creations = 0;
            self.join_attempts = 0;
            self.window_start = Instant::now();
        }
    }

    fn try_room_creation(&mut self, config: &RateLimitConfig, window: Duration) -> bool {
        self.maybe_reset_window(window);
        if self.room_creations < config.max_room_creations {
            self.room_creations += 1;
            self.join_attempts += 1;
            true
        } else {
            false
        }
    }

    fn try_join_attempt(&mut self, config: &RateLimitConfig, window: Duration) -> bool {
        self.maybe_reset_window(window);
        if self.join_attempts < config.max_join_attempts {
            self.join_attempts += 1;
            true
        } else {
            false
        }
    }

    fn time_until_reset(&self, window: Duration) -> Duration {
        window.saturating_sub(self.window_start.elapsed())
    }
}

/// Rate limiter for room creation and join attempts, keyed by caller identity.
pub struct RoomRateLimiter {
    config: RateLimitConfig,
    window: Duration,
    entries: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
}

impl RoomRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.time_window);
        Self {
            config,
            window,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn check_room_creation(&self, caller: &str) -> Result<(), RateLimitError> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(caller.to_string()).or_insert_with(RateLimitEntry::new);

        if entry.try_room_creation(&self.config, self.window) {
            Ok(())
        } else {
            Err(RateLimitError::RoomCreationLimitExceeded {
                retry_after: entry.time_until_reset(self.window),
            })
        }
    }

    pub async fn check_join_attempt(&self, caller: &str) -> Result<(), RateLimitError> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(caller.to_string()).or_insert_with(RateLimitEntry::new);

        if entry.try_join_attempt(&self.config, self.window) {
            Ok(())
        } else {
            Err(RateLimitError::JoinLimitExceeded {
                retry_after: entry.time_until_reset(self.window),
            })
        }
    }

    pub async fn cleanup_old_entries(&self) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let cleanup_threshold = self.window * 2;
        entries.retain(|_, entry| now.duration_since(entry.window_start) < cleanup_threshold);
    }

    pub fn start_cleanup_task(self: Arc<Self>) {
        let rate_limiter = Arc::clone(&self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(rate_limiter.window);
            loop {
                interval.tick().await;
                rate_limiter.cleanup_old_entries().await;
            }
        });
    }

    pub async fn get_caller_stats(&self, caller: &str) -> Option<CallerRateStats> {
        let entries = self.entries.read().await;
        entries.get(caller).map(|entry| CallerRateStats {
            room_creations: entry.room_creations,
            join_attempts: entry.join_attempts,
            time_until_reset: entry.time_until_reset(self.window),
        })
    }
}

#[derive(Debug, Clone)]
pub enum RateLimitError {
    RoomCreationLimitExceeded { retry_after: Duration },
    JoinLimitExceeded { retry_after: Duration },
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomCreationLimitExceeded { retry_after } => {
                write!(f, "room creation rate limit exceeded, try again in {}s", retry_after.as_secs())
            }
            Self::JoinLimitExceeded { retry_after } => {
                write!(f, "join attempt rate limit exceeded, try again in {}s", retry_after.as_secs())
            }
        }
    }
}

impl std::error::Error for RateLimitError {}

#[derive(Debug, Clone)]
pub struct CallerRateStats {
    pub room_creations: u32,
    pub join_attempts: u32,
    pub time_until_reset: Duration,
}
