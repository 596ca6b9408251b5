//! In-process counters and latency histograms for the Ludo arena server.
//!
//! Everything here is plain atomics plus an `hdrhistogram`-backed latency
//! tracker behind a `tokio::sync::RwLock`; there is no external metrics
//! backend, only a JSON snapshot served from `/metrics`.

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Process-wide metrics for the arena server.
#[derive(Debug)]
pub struct ServerMetrics {
    // Connection metrics
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub disconnections: AtomicU64,
    pub connection_errors: AtomicU64,
    pub websocket_messages_dropped: AtomicU64,

    // Room operation metrics
    pub rooms_created: AtomicU64,
    pub rooms_joined: AtomicU64,
    pub room_creation_failures: AtomicU64,
    pub room_join_failures: AtomicU64,
    pub rooms_deleted: AtomicU64,
    pub room_code_collisions: AtomicU64,

    // Retry metrics
    pub retry_attempts: AtomicU64,
    pub retry_successes: AtomicU64,

    // Performance metrics
    pub query_count: AtomicU64,
    pub average_response_times: Arc<RwLock<ResponseTimeTracker>>,
    pub latency_histogram_clamped_samples: AtomicU64,

    // Rate limiting metrics
    pub rate_limit_rejections: AtomicU64,
    pub rate_limit_resets: AtomicU64,

    // Player activity metrics
    pub players_joined: AtomicU64,
    pub players_left: AtomicU64,
    pub pieces_moved: AtomicU64,
    pub pieces_captured: AtomicU64,
    pub games_won: AtomicU64,
    pub chat_messages: AtomicU64,

    // Turn controller metrics
    pub turns_advanced: AtomicU64,
    pub turns_missed: AtomicU64,
    pub players_forfeited_for_inactivity: AtomicU64,

    // Reconnection metrics
    pub reconnection_sessions_active: AtomicU64,
    pub reconnection_completions: AtomicU64,

    // Error tracking
    pub validation_errors: AtomicU64,
    pub internal_errors: AtomicU64,
    pub websocket_errors: AtomicU64,

    // Cleanup metrics
    pub empty_rooms_cleaned: AtomicU64,
    pub finished_rooms_cleaned: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitWindow {
    Minute,
    Hour,
    Day,
}

#[derive(Debug, Clone)]
pub struct ResponseTimeTracker {
    operations: HashMap<String, OperationLatencyHistogram>,
    lowest_discernible_micros: u64,
    highest_trackable_micros: u64,
    significant_figures: u8,
}

const DEFAULT_LOWEST_DISCERNIBLE_MICROS: u64 = 1;
const DEFAULT_HIGHEST_TRACKABLE_MICROS: u64 = 300_000_000; // 5 minutes in microseconds
const DEFAULT_SIGNIFICANT_FIGURES: u8 = 3;

#[derive(Debug, Clone)]
struct OperationLatencyHistogram {
    /// `None` if every histogram-creation attempt failed (should be rare).
    histogram: Option<Histogram<u64>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub connections: ConnectionMetrics,
    pub rooms: RoomMetrics,
    pub performance: PerformanceMetrics,
    pub rate_limiting: RateLimitingMetrics,
    pub players: PlayerMetrics,
    pub turns: TurnMetrics,
    pub errors: ErrorMetrics,
    pub cleanup: CleanupMetrics,
    pub reconnection: ReconnectionMetrics,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectionMetrics {
    pub total_connections: u64,
    pub active_connections: u64,
    pub disconnections: u64,
    pub connection_errors: u64,
    pub websocket_messages_dropped: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoomMetrics {
    pub rooms_created: u64,
    pub rooms_joined: u64,
    pub room_creation_failures: u64,
    pub room_join_failures: u64,
    pub rooms_deleted: u64,
    pub room_code_collisions: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PerformanceMetrics {
    pub query_count: u64,
    pub retry_attempts: u64,
    pub retry_successes: u64,
    pub retry_success_rate: f64,
    pub room_creation_latency: OperationLatencyMetrics,
    pub turn_action_latency: OperationLatencyMetrics,
    pub latency_histogram_clamped_samples: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct OperationLatencyMetrics {
    pub average_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub sample_count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateLimitingMetrics {
    pub rejections: u64,
    pub resets: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerMetrics {
    pub players_joined: u64,
    pub players_left: u64,
    pub pieces_moved: u64,
    pub pieces_captured: u64,
    pub games_won: u64,
    pub chat_messages: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TurnMetrics {
    pub turns_advanced: u64,
    pub turns_missed: u64,
    pub players_forfeited_for_inactivity: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReconnectionMetrics {
    pub sessions_active: u64,
    pub completions: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorMetrics {
    pub validation_errors: u64,
    pub internal_errors: u64,
    pub websocket_errors: u64,
    pub total_errors: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CleanupMetrics {
    pub empty_rooms_cleaned: u64,
    pub finished_rooms_cleaned: u64,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            disconnections: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            websocket_messages_dropped: AtomicU64::new(0),
            rooms_created: AtomicU64::new(0),
            rooms_joined: AtomicU64::new(0),
            room_creation_failures: AtomicU64::new(0),
            room_join_failures: AtomicU64::new(0),
            rooms_deleted: AtomicU64::new(0),
            room_code_collisions: AtomicU64::new(0),
            retry_attempts: AtomicU64::new(0),
            retry_successes: AtomicU64::new(0),
            query_count: AtomicU64::new(0),
            average_response_times: Arc::new(RwLock::new(ResponseTimeTracker::new())),
            latency_histogram_clamped_samples: AtomicU64::new(0),
            rate_limit_rejections: AtomicU64::new(0),
            rate_limit_resets: AtomicU64::new(0),
            players_joined: AtomicU64::new(0),
            players_left: AtomicU64::new(0),
            pieces_moved: AtomicU64::new(0),
            pieces_captured: AtomicU64::new(0),
            games_won: AtomicU64::new(0),
            chat_messages: AtomicU64::new(0),
            turns_advanced: AtomicU64::new(0),
            turns_missed: AtomicU64::new(0),
            players_forfeited_for_inactivity: AtomicU64::new(0),
            reconnection_sessions_active: AtomicU64::new(0),
            reconnection_completions: AtomicU64::new(0),
            validation_errors: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
            websocket_errors: AtomicU64::new(0),
            empty_rooms_cleaned: AtomicU64::new(0),
            finished_rooms_cleaned: AtomicU64::new(0),
        }
    }

    // Connection metrics
    pub fn increment_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active_connections(&self) {
        let _ =
            self.active_connections
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    if current > 0 {
                        Some(current - 1)
                    } else {
                        None
                    }
                });
        self.disconnections.fetch_add(1, Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub fn increment_connection_errors(&self) {
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_websocket_messages_dropped(&self) {
        self.websocket_messages_dropped
            .fetch_add(1, Ordering::Relaxed);
    }

    // Room operation metrics
    pub fn increment_rooms_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rooms_joined(&self) {
        self.rooms_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_room_creation_failures(&self) {
        self.room_creation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_room_join_failures(&self) {
        self.room_join_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rooms_deleted(&self) {
        self.rooms_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_room_code_collisions(&self) {
        self.room_code_collisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_attempts(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retry_successes(&self) {
        self.retry_successes.fetch_add(1, Ordering::Relaxed);
    }

    // Performance metrics
    pub fn increment_query_count(&self) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn record_response_time(&self, operation: &str, duration: Duration) {
        let mut tracker = self.average_response_times.write().await;
        let clamped = tracker.add_sample(operation, duration);
        drop(tracker);
        if clamped {
            self.increment_latency_histogram_clamps();
        }
    }

    pub fn increment_latency_histogram_clamps(&self) {
        self.latency_histogram_clamped_samples
            .fetch_add(1, Ordering::Relaxed);
    }

    // Rate limiting metrics
    pub fn increment_rate_limit_rejections(&self) {
        self.rate_limit_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub fn increment_rate_limit_resets(&self) {
        self.rate_limit_resets.fetch_add(1, Ordering::Relaxed);
    }

    // Player activity metrics
    pub fn increment_players_joined(&self) {
        self.players_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_players_left(&self) {
        self.players_left.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_pieces_moved(&self) {
        self.pieces_moved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_pieces_captured(&self) {
        self.pieces_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_games_won(&self) {
        self.games_won.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chat_messages(&self) {
        self.chat_messages.fetch_add(1, Ordering::Relaxed);
    }

    // Turn controller metrics
    pub fn increment_turns_advanced(&self) {
        self.turns_advanced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_turns_missed(&self) {
        self.turns_missed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_players_forfeited_for_inactivity(&self) {
        self.players_forfeited_for_inactivity
            .fetch_add(1, Ordering::Relaxed);
    }

    // Reconnection metrics
    pub fn increment_reconnection_sessions_active(&self) {
        self.reconnection_sessions_active
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_reconnection_sessions_active(&self) {
        // fetch_update prevents underflow if two call sites race to decrement.
        let _ = self.reconnection_sessions_active.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |current| {
                if current > 0 {
                    Some(current - 1)
                } else {
                    None
                }
            },
        );
    }

    pub fn increment_reconnection_completions(&self) {
        self.reconnection_completions
            .fetch_add(1, Ordering::Relaxed);
    }

    // Error tracking
    pub fn increment_validation_errors(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_internal_errors(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_websocket_errors(&self) {
        self.websocket_errors.fetch_add(1, Ordering::Relaxed);
    }

    // Cleanup metrics
    pub fn add_empty_rooms_cleaned(&self, count: u64) {
        self.empty_rooms_cleaned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_finished_rooms_cleaned(&self, count: u64) {
        self.finished_rooms_cleaned
            .fetch_add(count, Ordering::Relaxed);
    }

    // Snapshot generation
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let tracker = self.average_response_times.read().await;
        let room_creation_latency = tracker
            .get_latency_metrics("room_creation")
            .unwrap_or_default();
        let turn_action_latency = tracker
            .get_latency_metrics("turn_action")
            .unwrap_or_default();
        drop(tracker);

        let retry_attempts = self.retry_attempts.load(Ordering::Relaxed);
        let retry_successes = self.retry_successes.load(Ordering::Relaxed);
        let retry_success_rate = if retry_attempts > 0 {
            (retry_successes as f64) / (retry_attempts as f64)
        } else {
            1.0
        };

        let validation_errors = self.validation_errors.load(Ordering::Relaxed);
        let internal_errors = self.internal_errors.load(Ordering::Relaxed);
        let websocket_errors = self.websocket_errors.load(Ordering::Relaxed);
        let total_errors = validation_errors + internal_errors + websocket_errors;

        MetricsSnapshot {
            timestamp: chrono::Utc::now(),
            connections: ConnectionMetrics {
                total_connections: self.total_connections.load(Ordering::Relaxed),
                active_connections: self.active_connections.load(Ordering::Relaxed),
                disconnections: self.disconnections.load(Ordering::Relaxed),
                connection_errors: self.connection_errors.load(Ordering::Relaxed),
                websocket_messages_dropped: self.websocket_messages_dropped.load(Ordering::Relaxed),
            },
            rooms: RoomMetrics {
                rooms_created: self.rooms_created.load(Ordering::Relaxed),
                rooms_joined: self.rooms_joined.load(Ordering::Relaxed),
                room_creation_failures: self.room_creation_failures.load(Ordering::Relaxed),
                room_join_failures: self.room_join_failures.load(Ordering::Relaxed),
                rooms_deleted: self.rooms_deleted.load(Ordering::Relaxed),
                room_code_collisions: self.room_code_collisions.load(Ordering::Relaxed),
            },
            performance: PerformanceMetrics {
                query_count: self.query_count.load(Ordering::Relaxed),
                retry_attempts,
                retry_successes,
                retry_success_rate,
                room_creation_latency,
                turn_action_latency,
                latency_histogram_clamped_samples: self
                    .latency_histogram_clamped_samples
                    .load(Ordering::Relaxed),
            },
            rate_limiting: RateLimitingMetrics {
                rejections: self.rate_limit_rejections.load(Ordering::Relaxed),
                resets: self.rate_limit_resets.load(Ordering::Relaxed),
            },
            players: PlayerMetrics {
                players_joined: self.players_joined.load(Ordering::Relaxed),
                players_left: self.players_left.load(Ordering::Relaxed),
                pieces_moved: self.pieces_moved.load(Ordering::Relaxed),
                pieces_captured: self.pieces_captured.load(Ordering::Relaxed),
                games_won: self.games_won.load(Ordering::Relaxed),
                chat_messages: self.chat_messages.load(Ordering::Relaxed),
            },
            turns: TurnMetrics {
                turns_advanced: self.turns_advanced.load(Ordering::Relaxed),
                turns_missed: self.turns_missed.load(Ordering::Relaxed),
                players_forfeited_for_inactivity: self
                    .players_forfeited_for_inactivity
                    .load(Ordering::Relaxed),
            },
            errors: ErrorMetrics {
                validation_errors,
                internal_errors,
                websocket_errors,
                total_errors,
            },
            cleanup: CleanupMetrics {
                empty_rooms_cleaned: self.empty_rooms_cleaned.load(Ordering::Relaxed),
                finished_rooms_cleaned: self.finished_rooms_cleaned.load(Ordering::Relaxed),
            },
            reconnection: ReconnectionMetrics {
                sessions_active: self.reconnection_sessions_active.load(Ordering::Relaxed),
                completions: self.reconnection_completions.load(Ordering::Relaxed),
            },
        }
    }

    /// A human-readable health status derived from the current snapshot.
    #[allow(dead_code)]
    pub async fn health_status(&self) -> HealthStatus {
        let snapshot = self.snapshot().await;

        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        let total_operations = snapshot.rooms.rooms_created + snapshot.rooms.rooms_joined;
        let total_failures =
            snapshot.rooms.room_creation_failures + snapshot.rooms.room_join_failures;

        if total_operations > 0 {
            let failure_rate = (total_failures as f64) / (total_operations as f64);
            if failure_rate > 0.1 {
                issues.push(format!("High failure rate: {:.1}%", failure_rate * 100.0));
            } else if failure_rate > 0.05 {
                warnings.push(format!(
                    "Elevated failure rate: {:.1}%",
                    failure_rate * 100.0
                ));
            }
        }

        if snapshot.rooms.room_code_collisions > 0 {
            warnings.push(format!(
                "Room code collisions: {}",
                snapshot.rooms.room_code_collisions
            ));
        }

        if snapshot.performance.retry_success_rate < 0.9 && snapshot.performance.retry_attempts > 0
        {
            warnings.push(format!(
                "Retry issues: {:.1}% success rate",
                snapshot.performance.retry_success_rate * 100.0
            ));
        }

        let status = if !issues.is_empty() {
            HealthStatusLevel::Unhealthy
        } else if !warnings.is_empty() {
            HealthStatusLevel::Degraded
        } else {
            HealthStatusLevel::Healthy
        };

        HealthStatus {
            status,
            issues,
            warnings,
            metrics: snapshot,
        }
    }
}

impl Default for ResponseTimeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseTimeTracker {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
            lowest_discernible_micros: DEFAULT_LOWEST_DISCERNIBLE_MICROS,
            highest_trackable_micros: DEFAULT_HIGHEST_TRACKABLE_MICROS,
            significant_figures: DEFAULT_SIGNIFICANT_FIGURES,
        }
    }

    #[cfg(test)]
    pub fn with_bounds(
        lowest_discernible_micros: u64,
        highest_trackable_micros: u64,
        significant_figures: u8,
    ) -> Self {
        Self {
            operations: HashMap::new(),
            lowest_discernible_micros: lowest_discernible_micros.max(1),
            highest_trackable_micros: highest_trackable_micros
                .max(lowest_discernible_micros.max(1)),
            significant_figures: significant_figures.clamp(1, 5),
        }
    }

    pub fn add_sample(&mut self, operation: &str, duration: Duration) -> bool {
        let micros = duration_to_micros(duration);
        let lowest = self.lowest_discernible_micros;
        let highest = self.highest_trackable_micros;
        let significant = self.significant_figures;
        let histogram = self
            .operations
            .entry(operation.to_string())
            .or_insert_with(|| OperationLatencyHistogram::new(lowest, highest, significant));

        histogram.record(micros, highest)
    }

    pub fn get_average(&self, operation: &str) -> Option<f64> {
        self.get_latency_metrics(operation)
            .and_then(|metrics| metrics.average_ms)
    }

    pub fn get_latency_metrics(&self, operation: &str) -> Option<OperationLatencyMetrics> {
        let histogram = self.operations.get(operation)?;
        histogram.metrics()
    }
}

impl OperationLatencyHistogram {
    fn new(
        lowest_discernible_micros: u64,
        highest_trackable_micros: u64,
        significant_figures: u8,
    ) -> Self {
        let lowest = lowest_discernible_micros.max(1);
        let highest = highest_trackable_micros.max(lowest);
        let sig_figs = significant_figures.clamp(1, 5);

        // Try to create histogram with requested bounds; fall back to unbounded if that fails.
        let histogram = Histogram::new_with_bounds(lowest, highest, sig_figs)
            .or_else(|e| {
                tracing::warn!(
                    target: "metrics",
                    error = %e,
                    lowest,
                    highest,
                    sig_figs,
                    "failed to create histogram with requested bounds, using unbounded fallback"
                );
                Histogram::new(2)
            })
            .or_else(|_| {
                tracing::error!(target: "metrics", "Histogram::new(2) failed, trying sig_figs=1");
                Histogram::new(1)
            })
            .ok();

        if histogram.is_none() {
            tracing::error!(target: "metrics", "all histogram creation attempts failed - metrics will not be recorded");
        }

        Self { histogram }
    }

    fn record(&mut self, micros: u64, highest_trackable_micros: u64) -> bool {
        let was_clamped = micros > highest_trackable_micros;
        let value = if was_clamped {
            highest_trackable_micros
        } else {
            micros
        };
        if let Some(ref mut histogram) = self.histogram {
            if let Err(error) = histogram.record(value) {
                tracing::warn!(
                    target: "metrics",
                    %error,
                    clamped_value = value,
                    highest_trackable_micros,
                    "failed to record latency sample"
                );
            }
        }
        was_clamped
    }

    fn metrics(&self) -> Option<OperationLatencyMetrics> {
        let histogram = self.histogram.as_ref()?;
        if histogram.is_empty() {
            return None;
        }

        Some(OperationLatencyMetrics {
            average_ms: Some(histogram.mean() / MICROS_PER_MS),
            p50_ms: Some(self.percentile(50.0)),
            p95_ms: Some(self.percentile(95.0)),
            p99_ms: Some(self.percentile(99.0)),
            min_ms: Some(histogram.min() as f64 / MICROS_PER_MS),
            max_ms: Some(histogram.max() as f64 / MICROS_PER_MS),
            sample_count: histogram.len(),
        })
    }

    fn percentile(&self, percentile: f64) -> f64 {
        self.histogram
            .as_ref()
            .map(|h| h.value_at_percentile(percentile) as f64 / MICROS_PER_MS)
            .unwrap_or(0.0)
    }
}

const MICROS_PER_MS: f64 = 1000.0;

fn duration_to_micros(duration: Duration) -> u64 {
    duration.as_micros().min(u128::from(u64::MAX)) as u64
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthStatus {
    pub status: HealthStatusLevel,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum HealthStatusLevel {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Utility for timing an operation and recording it into `ServerMetrics`.
#[allow(dead_code)]
pub struct OperationTimer {
    operation: String,
    start: Instant,
    metrics: Arc<ServerMetrics>,
}

impl OperationTimer {
    pub fn new(operation: &str, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
            metrics,
        }
    }

    #[allow(dead_code)]
    pub async fn finish(self) {
        let duration = self.start.elapsed();
        self.metrics
            .record_response_time(&self.operation, duration)
            .await;
    }

    #[allow(dead_code)]
    pub async fn finish_with_result<T, E>(self, result: &Result<T, E>) {
        let duration = self.start.elapsed();
        self.metrics
            .record_response_time(&self.operation, duration)
            .await;

        if result.is_err() {
            match self.operation.as_str() {
                "room_creation" => self.metrics.increment_room_creation_failures(),
                "room_join" => self.metrics.increment_room_join_failures(),
                _ => self.metrics.increment_internal_errors(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Decrement from 0 stays at 0, not u64::MAX (underflow prevention).
    #[tokio::test]
    async fn test_decrement_active_connections_no_underflow() {
        let metrics = ServerMetrics::new();

        for _ in 0..10 {
            metrics.decrement_active_connections();
        }

        let value = metrics.active_connections.load(Ordering::Relaxed);
        assert_eq!(
            value, 0,
            "active_connections should remain 0 after decrement from 0, got {value}"
        );
        assert_eq!(
            metrics.disconnections.load(Ordering::Relaxed),
            10,
            "disconnections should still be incremented even when active_connections was already 0"
        );
    }

    /// Decrement reconnection_sessions_active from 0 stays at 0.
    #[tokio::test]
    async fn test_decrement_reconnection_sessions_no_underflow() {
        let metrics = ServerMetrics::new();

        for _ in 0..10 {
            metrics.decrement_reconnection_sessions_active();
        }

        let value = metrics.reconnection_sessions_active.load(Ordering::Relaxed);
        assert_eq!(
            value, 0,
            "reconnection_sessions_active should remain 0 after decrement from 0, got {value}"
        );
    }

    /// Sequential phases of concurrent operations yield the correct count.
    #[tokio::test]
    async fn test_concurrent_increment_decrement_active_connections() {
        let metrics = Arc::new(ServerMetrics::new());

        let inc_barrier = Arc::new(tokio::sync::Barrier::new(100));
        let mut handles = Vec::with_capacity(100);
        for _ in 0..100 {
            let metrics = Arc::clone(&metrics);
            let barrier = Arc::clone(&inc_barrier);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                metrics.increment_connections();
            }));
        }
        for handle in handles {
            handle.await.expect("increment task should not panic");
        }

        let after_inc = metrics.active_connections.load(Ordering::Relaxed);
        assert_eq!(
            after_inc, 100,
            "after 100 increments, active_connections should be 100, got {after_inc}"
        );

        let dec_barrier = Arc::new(tokio::sync::Barrier::new(50));
        let mut handles = Vec::with_capacity(50);
        for _ in 0..50 {
            let metrics = Arc::clone(&metrics);
            let barrier = Arc::clone(&dec_barrier);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                metrics.decrement_active_connections();
            }));
        }
        for handle in handles {
            handle.await.expect("decrement task should not panic");
        }

        let final_value = metrics.active_connections.load(Ordering::Relaxed);
        assert_eq!(
            final_value, 50,
            "after 100 increments and 50 decrements, active_connections should be 50, got {final_value}"
        );

        let total = metrics.total_connections.load(Ordering::Relaxed);
        assert_eq!(
            total, 100,
            "total_connections should be 100 (never decremented), got {total}"
        );
    }

    #[test]
    fn response_time_tracker_reports_percentiles() {
        let mut tracker = ResponseTimeTracker::with_bounds(1, 60_000_000, 3);
        for ms in [10, 20, 30, 40, 50] {
            tracker.add_sample("turn_action", Duration::from_millis(ms));
        }
        let metrics = tracker.get_latency_metrics("turn_action").unwrap();
        assert_eq!(metrics.sample_count, 5);
        assert!(metrics.average_ms.unwrap() > 0.0);
        assert!(metrics.p99_ms.unwrap() >= metrics.p50_ms.unwrap());
    }
}
