//! The Room Registry: a `DashMap` from game code to `RoomHandle`, guarded
//! only across lookup/insert/remove so a room's own command inbox — never
//! the registry's map — is what serializes gameplay.
//!
//! Grounded on the teacher's `room_applications: Arc<DashMap<RoomId, Uuid>>`
//! field in `server.rs` and the periodic sweep idiom in `server/maintenance.rs`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::Config;
use crate::game::model::RoomType;
use crate::metrics::ServerMetrics;
use crate::ports::{Ports, TournamentStatus};
use crate::protocol::{GameCode, PlayerId};
use crate::room::{spawn_room, RoomHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// No manual room exists for this code and none may be created.
    RoomNotFound,
    /// A tournament exists for this code but has already completed.
    TournamentCompleted,
    /// The tournament lookup itself failed (storage unavailable).
    LookupFailed,
}

pub struct Registry {
    rooms: DashMap<String, RoomHandle>,
    ports: Arc<Ports>,
    config: Arc<Config>,
    metrics: Arc<ServerMetrics>,
}

impl Registry {
    pub fn new(ports: Arc<Ports>, config: Arc<Config>, metrics: Arc<ServerMetrics>) -> Arc<Self> {
        Arc::new(Self { rooms: DashMap::new(), ports, config, metrics })
    }

    /// Looks up an existing room or lazily creates one for `code`, seeding
    /// its shape from the tournament record (if any) per spec.md's Room
    /// Registry rules. `first_user_id` becomes the new room's nominal host
    /// if a room has to be created.
    pub async fn get_or_create_room(
        &self,
        code: &GameCode,
        first_user_id: &PlayerId,
    ) -> Result<RoomHandle, RegistryError> {
        if let Some(existing) = self.rooms.get(code.as_str()) {
            return Ok(existing.clone());
        }

        let tournament = self
            .ports
            .persistence
            .find_tournament_by_code(code.as_str())
            .await
            .map_err(|_| RegistryError::LookupFailed)?;

        let (room_type, max_players, tournament_id) = match tournament {
            Some(record) if record.status == TournamentStatus::Active => {
                (RoomType::Tournament, record.max_players, Some(record.tournament_id))
            }
            Some(_) => return Err(RegistryError::TournamentCompleted),
            None => {
                if !self.config.server.allow_manual_rooms {
                    return Err(RegistryError::RoomNotFound);
                }
                (RoomType::Manual, self.config.protocol.max_players_limit, None)
            }
        };

        match self.rooms.entry(code.as_str().to_string()) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                let handle = spawn_room(
                    code.clone(),
                    room_type,
                    max_players,
                    first_user_id.clone(),
                    tournament_id,
                    Arc::clone(&self.ports),
                    Arc::clone(&self.config),
                    Arc::clone(&self.metrics),
                );
                slot.insert(handle.clone());
                self.metrics.increment_rooms_created();
                Ok(handle)
            }
        }
    }

    /// Spawns the periodic eviction sweep: rooms finished for longer than
    /// `finished_eviction_secs`, or with zero connected writers for longer
    /// than `empty_room_eviction_secs`, are torn down.
    pub fn start_eviction_sweep(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                self.sweep_once().await;
            }
        });
    }

    async fn sweep_once(&self) {
        let finished_eviction = Duration::from_secs(self.config.server.finished_eviction_secs);
        let empty_eviction = Duration::from_secs(self.config.server.empty_room_eviction_secs);

        let mut to_evict = Vec::new();
        for entry in self.rooms.iter() {
            let meta = entry.value().meta();
            let should_evict = meta
                .finished_at
                .is_some_and(|at| at.elapsed() >= finished_eviction)
                || meta.emptied_at.is_some_and(|at| at.elapsed() >= empty_eviction);
            if should_evict {
                to_evict.push((entry.key().clone(), meta));
            }
        }

        for (code, meta) in to_evict {
            if let Some((_, handle)) = self.rooms.remove(&code) {
                handle.evict().await;
                self.metrics.increment_rooms_deleted();
                if meta.finished_at.is_some() {
                    self.metrics.add_finished_rooms_cleaned(1);
                } else {
                    self.metrics.add_empty_rooms_cleaned(1);
                }
                tracing::info!(code = %code, "room evicted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{InMemoryIdentity, InMemoryPersistence, SystemClock, SystemRandom};

    fn test_registry() -> Arc<Registry> {
        let ports = Arc::new(Ports {
            clock: Arc::new(SystemClock),
            identity: Arc::new(InMemoryIdentity::new()),
            persistence: Arc::new(InMemoryPersistence::new()),
            random: Arc::new(SystemRandom),
        });
        Registry::new(ports, Arc::new(Config::default()), Arc::new(ServerMetrics::new()))
    }

    #[tokio::test]
    async fn manual_room_is_created_on_first_lookup() {
        let registry = test_registry();
        let code = GameCode::parse("ABCD").unwrap();
        let handle = registry.get_or_create_room(&code, &"p1".to_string()).await.unwrap();
        assert_eq!(handle.code.as_str(), "ABCD");
    }

    #[tokio::test]
    async fn second_lookup_returns_the_same_room() {
        let registry = test_registry();
        let code = GameCode::parse("ABCD").unwrap();
        let first = registry.get_or_create_room(&code, &"p1".to_string()).await.unwrap();
        let second = registry.get_or_create_room(&code, &"p2".to_string()).await.unwrap();
        assert_eq!(first.code.as_str(), second.code.as_str());
        assert_eq!(registry.rooms.len(), 1);
    }

    #[tokio::test]
    async fn manual_rooms_rejected_when_disabled() {
        let mut config = Config::default();
        config.server.allow_manual_rooms = false;
        let ports = Arc::new(Ports {
            clock: Arc::new(SystemClock),
            identity: Arc::new(InMemoryIdentity::new()),
            persistence: Arc::new(InMemoryPersistence::new()),
            random: Arc::new(SystemRandom),
        });
        let registry = Registry::new(ports, Arc::new(config), Arc::new(ServerMetrics::new()));
        let code = GameCode::parse("ABCD").unwrap();
        let result = registry.get_or_create_room(&code, &"p1".to_string()).await;
        assert_eq!(result.unwrap_err(), RegistryError::RoomNotFound);
    }
}
