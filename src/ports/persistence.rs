//! Persistence port: tournament lookup, append-only chat/turn logs, and
//! wallet balance crediting. Every operation is best-effort from the game's
//! point of view — failures are logged and swallowed; the in-memory game
//! state remains authoritative regardless of persistence outcome.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::game::model::{ChatEntry, TurnEvent};
use crate::protocol::types::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone)]
pub struct TournamentRecord {
    pub tournament_id: String,
    pub game_code: String,
    pub max_players: u8,
    pub status: TournamentStatus,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn find_tournament_by_code(
        &self,
        game_code: &str,
    ) -> Result<Option<TournamentRecord>, PersistenceError>;

    async fn append_chat(
        &self,
        tournament_id: &str,
        entry: &ChatEntry,
    ) -> Result<(), PersistenceError>;

    async fn append_turn_event(
        &self,
        tournament_id: &str,
        event: &TurnEvent,
    ) -> Result<(), PersistenceError>;

    /// Credit `user_id`'s balance. Implementations must be idempotent per
    /// `transaction_id` — replays of the same id must not double-credit.
    async fn credit_balance(
        &self,
        user_id: &PlayerId,
        amount_cents: i64,
        transaction_id: &str,
    ) -> Result<(), PersistenceError>;
}

/// In-memory persistence: tournaments are seeded up front, logs and credited
/// transactions are retained only for the life of the process.
#[derive(Default)]
pub struct InMemoryPersistence {
    tournaments: RwLock<HashMap<String, TournamentRecord>>,
    applied_transactions: RwLock<std::collections::HashSet<String>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_tournament(&self, record: TournamentRecord) {
        self.tournaments
            .write()
            .unwrap()
            .insert(record.game_code.clone(), record);
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn find_tournament_by_code(
        &self,
        game_code: &str,
    ) -> Result<Option<TournamentRecord>, PersistenceError> {
        Ok(self.tournaments.read().unwrap().get(game_code).cloned())
    }

    async fn append_chat(
        &self,
        _tournament_id: &str,
        _entry: &ChatEntry,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn append_turn_event(
        &self,
        _tournament_id: &str,
        _event: &TurnEvent,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn credit_balance(
        &self,
        _user_id: &PlayerId,
        _amount_cents: i64,
        transaction_id: &str,
    ) -> Result<(), PersistenceError> {
        let mut applied = self.applied_transactions.write().unwrap();
        applied.insert(transaction_id.to_string());
        Ok(())
    }
}
