//! HTTP surface: the WebSocket upgrade at `/<GAMECODE>` plus the auxiliary
//! `/health`, `/ping`, and `/metrics` routes, composed the way the teacher's
//! `websocket/routes.rs` merges the upgrade route with its own auxiliary
//! endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::connect_info::ConnectInfo;
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::config::Config;
use crate::metrics::ServerMetrics;
use crate::ports::Ports;
use crate::protocol::{validation, GameCode};
use crate::rate_limit::RoomRateLimiter;
use crate::registry::Registry;

use super::connection;

/// Shared state handed to every connection and HTTP handler.
pub struct AppState {
    pub config: Arc<Config>,
    pub ports: Arc<Ports>,
    pub registry: Arc<Registry>,
    pub rate_limiter: Arc<RoomRateLimiter>,
    pub metrics: Arc<ServerMetrics>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .route("/metrics", get(metrics))
        .route("/{code}", get(websocket_upgrade))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn ping() -> &'static str {
    "pong"
}

/// Serves the current metrics snapshot as Prometheus text exposition
/// format, gated by the same bearer-token requirement as the teacher's
/// `websocket/prometheus.rs` when `require_metrics_auth` is set.
async fn metrics(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if state.config.security.require_metrics_auth {
        let authorized = state
            .config
            .security
            .metrics_auth_token
            .as_deref()
            .is_some_and(|expected| {
                headers
                    .get(axum::http::header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .is_some_and(|token| token == expected)
            });
        if !authorized {
            return (StatusCode::UNAUTHORIZED, "metrics authentication required").into_response();
        }
    }

    let snapshot = state.metrics.snapshot().await;
    (StatusCode::OK, render_prometheus(&snapshot)).into_response()
}

fn render_prometheus(snapshot: &crate::metrics::MetricsSnapshot) -> String {
    let mut out = String::new();
    out.push_str("# TYPE ludo_active_connections gauge\n");
    out.push_str(&format!(
        "ludo_active_connections {}\n",
        snapshot.connections.active_connections
    ));
    out.push_str("# TYPE ludo_rooms_created_total counter\n");
    out.push_str(&format!("ludo_rooms_created_total {}\n", snapshot.rooms.rooms_created));
    out.push_str("# TYPE ludo_rooms_deleted_total counter\n");
    out.push_str(&format!("ludo_rooms_deleted_total {}\n", snapshot.rooms.rooms_deleted));
    out.push_str("# TYPE ludo_players_joined_total counter\n");
    out.push_str(&format!("ludo_players_joined_total {}\n", snapshot.players.players_joined));
    out.push_str("# TYPE ludo_pieces_moved_total counter\n");
    out.push_str(&format!("ludo_pieces_moved_total {}\n", snapshot.players.pieces_moved));
    out.push_str("# TYPE ludo_pieces_captured_total counter\n");
    out.push_str(&format!("ludo_pieces_captured_total {}\n", snapshot.players.pieces_captured));
    out.push_str("# TYPE ludo_turns_missed_total counter\n");
    out.push_str(&format!("ludo_turns_missed_total {}\n", snapshot.turns.turns_missed));
    out.push_str("# TYPE ludo_errors_total counter\n");
    out.push_str(&format!("ludo_errors_total {}\n", snapshot.errors.total_errors));
    out
}

async fn websocket_upgrade(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(reason) = validation::validate_game_code_with_config(&code, &state.config.protocol) {
        return (StatusCode::BAD_REQUEST, reason).into_response();
    }
    let Some(code) = GameCode::parse(&code) else {
        return (StatusCode::BAD_REQUEST, "invalid game code").into_response();
    };

    ws.max_message_size(state.config.websocket.max_message_size)
        .on_upgrade(move |socket| async move {
            state.metrics.increment_connections();
            connection::handle_socket(socket, state.clone(), code, addr).await;
            state.metrics.decrement_active_connections();
        })
}
