//! Auxiliary HTTP surface tests driven through `axum-test` against the
//! router directly, without opening a real socket — grounded on the
//! teacher's use of `axum-test` for its non-WebSocket route assertions.


use std::sync::Arc;

use axum_test::TestServer;
use ludo_arena_server::config::Config;
use ludo_arena_server::metrics::ServerMetrics;
use ludo_arena_server::ports::{InMemoryIdentity, InMemoryPersistence, Ports, SystemClock, SystemRandom};
use ludo_arena_server::rate_limit::RoomRateLimiter;
use ludo_arena_server::registry::Registry;
use ludo_arena_server::session::{create_router, AppState};

fn test_state(config: Config) -> Arc<AppState> {
    let config = Arc::new(config);
    let ports = Arc::new(Ports {
        clock: Arc::new(SystemClock),
        identity: Arc::new(InMemoryIdentity::new()),
        persistence: Arc::new(InMemoryPersistence::new()),
        random: Arc::new(SystemRandom),
    });
    let metrics = Arc::new(ServerMetrics::new());
    Arc::new(AppState {
        registry: Registry::new(ports.clone(), config.clone(), metrics.clone()),
        rate_limiter: Arc::new(RoomRateLimiter::new(config.rate_limit.clone())),
        config,
        ports,
        metrics,
    })
}

#[tokio::test]
async fn health_returns_ok() {
    let server = TestServer::new(create_router(test_state(Config::default()))).unwrap();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn ping_returns_pong() {
    let server = TestServer::new(create_router(test_state(Config::default()))).unwrap();
    let response = server.get("/ping").await;
    response.assert_status_ok();
    response.assert_text("pong");
}

#[tokio::test]
async fn metrics_is_open_by_default() {
    let server = TestServer::new(create_router(test_state(Config::default()))).unwrap();
    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("ludo_active_connections"));
}

#[tokio::test]
async fn metrics_requires_bearer_token_when_configured() {
    let mut config = Config::default();
    config.security.require_metrics_auth = true;
    config.security.metrics_auth_token = Some("s3cret".to_string());
    let server = TestServer::new(create_router(test_state(config))).unwrap();

    let unauthorized = server.get("/metrics").await;
    unauthorized.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let authorized = server.get("/metrics").add_header(axum::http::header::AUTHORIZATION, "Bearer s3cret").await;
    authorized.assert_status_ok();
}

#[tokio::test]
async fn config_defaults_match_the_specified_ludo_constants() {
    let config = Config::default();
    assert_eq!(config.server.turn_seconds, 30);
    assert_eq!(config.server.max_inactive_turns, 5);
    assert_eq!(config.protocol.max_players_limit, 4);
    assert!(config.server.allow_manual_rooms);
}
