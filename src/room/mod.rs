//! The Room Actor: one task per game, owning a single authoritative `Game`
//! and a command inbox that serializes every mutation.

pub mod actor;
pub mod commands;

pub use actor::{spawn_room, RoomHandle, RoomMeta};
pub use commands::{JoinError, RoomCommand};
