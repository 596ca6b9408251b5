#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Ludo Arena Server
//!
//! The authoritative realtime game server for a four-color board race
//! (Ludo) played between 2-4 authenticated players. Rooms run as
//! independent actor tasks; an in-memory deployment needs nothing beyond
//! this binary, and the `Ports` seam lets a real deployment swap in an
//! auth service, persistent storage, and a system clock without touching
//! the rule engine.

/// Server configuration: JSON file, stdin, and environment variable loading.
pub mod config;

/// The pure Ludo rule engine and board/session data model.
pub mod game;

/// Structured logging configuration.
pub mod logging;

/// Metrics collection and health reporting.
pub mod metrics;

/// External collaborator seams: clock, identity, persistence, randomness.
pub mod ports;

/// Wire message protocol: client/server JSON envelopes and validation.
pub mod protocol;

/// Sliding-window rate limiting for room creation and join attempts.
pub mod rate_limit;

/// Retry helper for best-effort persistence operations.
pub mod retry;

/// The Room Registry: looks up or lazily spawns Room Actors by game code.
pub mod registry;

/// The Room Actor: one task per game, serializing every mutation.
pub mod room;

/// The Session Layer: per-connection state machine and the HTTP/WS router.
pub mod session;

/// The Turn Controller: posts timer-driven commands back into a room's inbox.
pub mod turn_controller;
