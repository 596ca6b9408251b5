#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};

use ludo_arena_server::config;
use ludo_arena_server::logging;
use ludo_arena_server::metrics::ServerMetrics;
use ludo_arena_server::ports::{InMemoryIdentity, InMemoryPersistence, Ports};
use ludo_arena_server::rate_limit::RoomRateLimiter;
use ludo_arena_server::registry::Registry;
use ludo_arena_server::session::{create_router, AppState};

/// Ludo Arena -- authoritative realtime server for four-color board races
#[derive(Parser, Debug)]
#[command(name = "ludo-arena-server")]
#[command(about = "Authoritative realtime game server for a four-color board race (Ludo)")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    /// Useful for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present; otherwise use code defaults.
    let cfg = Arc::new(config::load());

    // Handle --print-config: output the loaded configuration as JSON
    if cli.print_config {
        let json = serde_json::to_string_pretty(&*cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    // Validate configuration security. Note: config::load() already calls
    // validate_config_security() but only logs errors to stderr and
    // continues. Here we capture the result to:
    // 1. Provide proper exit code for --validate-config mode
    // 2. Fail startup in production if critical settings are missing
    let validation_result = config::validate_config_security(&cfg);

    // Handle --validate-config: exit after validation
    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  Storage backend: InMemory");
                println!("  Metrics auth required: {}", cfg.security.require_metrics_auth);
                println!("  Reconnection enabled: {}", cfg.server.enable_reconnection);
                println!("  Max players per room: {}", cfg.protocol.max_players_limit);
                println!("  Manual rooms allowed: {}", cfg.server.allow_manual_rooms);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    // In normal operation, propagate validation errors
    validation_result?;

    // Initialize logging from config.
    logging::init_with_config(&cfg.logging);

    let port: u16 = cfg.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "Starting Ludo Arena server");

    let metrics = Arc::new(ServerMetrics::new());
    let ports = Arc::new(Ports::new(
        Arc::new(InMemoryIdentity::new()),
        Arc::new(InMemoryPersistence::new()),
    ));
    let registry = Registry::new(ports.clone(), cfg.clone(), metrics.clone());
    registry.clone().start_eviction_sweep();

    let rate_limiter = Arc::new(RoomRateLimiter::new(cfg.rate_limit.clone()));
    rate_limiter.clone().start_cleanup_task();

    let state = Arc::new(AppState {
        config: cfg.clone(),
        ports,
        registry,
        rate_limiter,
        metrics,
    });

    let cors = if cfg.security.cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cfg
            .security
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let router = create_router(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let make_service = router.into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, cors_origins = %cfg.security.cors_origins, "Server started — connect at /<GAMECODE>");

    axum::serve(listener, make_service).await?;

    Ok(())
}
