//! The Room Actor's command inbox. Every command — whether it originates
//! from a Session, the Turn Controller, or the Room Registry — is handled
//! strictly in arrival order by a single task, so no two commands ever
//! mutate the same `Game` concurrently.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::protocol::{ClientMessage, PlayerId, ServerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    /// The room is full and the caller is not an existing seat.
    RoomFull,
    /// The room is no longer accepting new seats (already Playing/Finished).
    InvalidRoomState,
    /// Another seat already holds this player name.
    NameTaken,
}

/// Commands accepted by a Room Actor. See `room::actor` for the handler.
pub enum RoomCommand {
    /// A session completed authentication and wants to occupy (or resume) a seat.
    Join {
        user_id: PlayerId,
        name: String,
        writer: mpsc::Sender<Arc<ServerMessage>>,
        reply: oneshot::Sender<Result<(), JoinError>>,
    },
    /// A post-auth client frame, forwarded verbatim for the actor to dispatch.
    Action { user_id: PlayerId, message: ClientMessage },
    /// The session's socket closed (or the client sent `LEAVE_GAME`).
    Leave { user_id: PlayerId },
    /// One second of wall-clock time has passed.
    Tick,
    /// The roll-resolution delay after `RollDice` has elapsed.
    ResolveRoll,
    /// The penalty-display delay after a no-move or forfeited roll has elapsed.
    AdvanceAfterNoMove,
    /// The tournament autostart delay has elapsed.
    AutoStart,
    /// The reconnect grace period for a disconnected player has elapsed
    /// without them rejoining.
    PruneDisconnect { user_id: PlayerId },
    /// The Registry has decided to tear this room down.
    Evict,
}
