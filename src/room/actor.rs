//! The Room Actor: a single-threaded, cooperative executor that owns one
//! `Game` and serializes every mutation through its command inbox.
//!
//! Grounded on the teacher's `EnhancedGameServer` + `server/room_service.rs`
//! split (one struct, methods fanned out by concern) and on the Turn
//! Controller design note in the specification: timers never touch `Game`
//! directly, they only ever post a command back into this same inbox.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

use crate::config::Config;
use crate::game::model::{ChatEntry, Game, GameStatus, RoomType, TurnEvent};
use crate::game::rules::{self, ActionOutcome};
use crate::metrics::ServerMetrics;
use crate::ports::Ports;
use crate::protocol::{ClientMessage, GameCode, PlayerId, ServerMessage};
use crate::retry;
use crate::turn_controller::{self, TurnController};

use super::commands::{JoinError, RoomCommand};

/// Snapshot of room health published after every command, consumed by the
/// Registry's eviction sweep without needing to reach into actor state.
#[derive(Debug, Clone, Copy)]
pub struct RoomMeta {
    pub status: GameStatus,
    pub connected_players: usize,
    pub finished_at: Option<Instant>,
    pub emptied_at: Option<Instant>,
}

/// A cheap, cloneable reference to a running Room Actor.
#[derive(Clone)]
pub struct RoomHandle {
    pub code: GameCode,
    tx: mpsc::Sender<RoomCommand>,
    meta: watch::Receiver<RoomMeta>,
}

impl RoomHandle {
    pub async fn join(
        &self,
        user_id: PlayerId,
        name: String,
        writer: mpsc::Sender<Arc<ServerMessage>>,
    ) -> Result<(), JoinError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(RoomCommand::Join { user_id, name, writer, reply: reply_tx })
            .await
            .is_err()
        {
            return Err(JoinError::InvalidRoomState);
        }
        reply_rx.await.unwrap_or(Err(JoinError::InvalidRoomState))
    }

    pub async fn action(&self, user_id: PlayerId, message: ClientMessage) {
        let _ = self.tx.send(RoomCommand::Action { user_id, message }).await;
    }

    pub async fn leave(&self, user_id: PlayerId) {
        let _ = self.tx.send(RoomCommand::Leave { user_id }).await;
    }

    pub async fn evict(&self) {
        let _ = self.tx.send(RoomCommand::Evict).await;
    }

    pub fn meta(&self) -> RoomMeta {
        *self.meta.borrow()
    }
}

/// Spawns a Room Actor task and returns a handle to it.
pub fn spawn_room(
    code: GameCode,
    room_type: RoomType,
    max_players: u8,
    host_id: PlayerId,
    tournament_id: Option<String>,
    ports: Arc<Ports>,
    config: Arc<Config>,
    metrics: Arc<ServerMetrics>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(256);
    let now = ports.clock.now();
    let game = Game::new(code.as_str().to_string(), room_type, max_players, host_id, tournament_id, now);

    let (meta_tx, meta_rx) = watch::channel(RoomMeta {
        status: game.status,
        connected_players: 0,
        finished_at: None,
        emptied_at: Some(Instant::now()),
    });

    let actor = RoomActor {
        code: code.clone(),
        game,
        writers: HashMap::new(),
        pending_prunes: HashMap::new(),
        turn_controller: None,
        inbox: tx.clone(),
        ports,
        config,
        metrics,
        meta_tx,
    };

    tokio::spawn(actor.run(rx).instrument(info_span!("room", code = %code)));

    RoomHandle { code, tx, meta: meta_rx }
}

struct RoomActor {
    code: GameCode,
    game: Game,
    writers: HashMap<PlayerId, mpsc::Sender<Arc<ServerMessage>>>,
    pending_prunes: HashMap<PlayerId, JoinHandle<()>>,
    turn_controller: Option<TurnController>,
    inbox: mpsc::Sender<RoomCommand>,
    ports: Arc<Ports>,
    config: Arc<Config>,
    metrics: Arc<ServerMetrics>,
    meta_tx: watch::Sender<RoomMeta>,
}

impl RoomActor {
    async fn run(mut self, mut rx: mpsc::Receiver<RoomCommand>) {
        tracing::info!("room actor started");
        while let Some(command) = rx.recv().await {
            let is_evict = matches!(command, RoomCommand::Evict);
            self.handle(command).await;
            self.publish_meta();
            if is_evict {
                break;
            }
        }
        if let Some(tc) = self.turn_controller.take() {
            tc.stop();
        }
        for prune in self.pending_prunes.drain().map(|(_, handle)| handle) {
            prune.abort();
        }
        tracing::info!("room actor stopped");
    }

    async fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { user_id, name, writer, reply } => {
                let span = info_span!("join", user_id = %user_id);
                let _guard = span.enter();
                let result = self.handle_join(user_id, name, writer);
                let _ = reply.send(result.map(|_| ()));
            }
            RoomCommand::Action { user_id, message } => {
                let span = info_span!("action", user_id = %user_id);
                let _guard = span.enter();
                self.handle_action(user_id, message).await;
            }
            RoomCommand::Leave { user_id } => {
                let span = info_span!("leave", user_id = %user_id);
                let _guard = span.enter();
                self.handle_leave(user_id).await;
            }
            RoomCommand::Tick => self.handle_tick().await,
            RoomCommand::ResolveRoll => self.handle_resolve_roll().await,
            RoomCommand::AdvanceAfterNoMove => self.handle_advance_after_no_move().await,
            RoomCommand::AutoStart => self.handle_autostart().await,
            RoomCommand::PruneDisconnect { user_id } => self.handle_prune_disconnect(user_id).await,
            RoomCommand::Evict => {
                tracing::info!("room evicted by registry");
            }
        }
    }

    fn handle_join(
        &mut self,
        user_id: PlayerId,
        name: String,
        writer: mpsc::Sender<Arc<ServerMessage>>,
    ) -> Result<usize, JoinError> {
        if let Some(seat) = self.game.seat_of(&user_id) {
            if let Some(pending) = self.pending_prunes.remove(&user_id) {
                pending.abort();
                self.metrics.decrement_reconnection_sessions_active();
                self.metrics.increment_reconnection_completions();
            }
            if let Some(player) = self.game.player_by_id_mut(&user_id) {
                player.disconnected = false;
            }
            self.writers.insert(user_id, writer);
            self.broadcast_state();
            return Ok(seat);
        }

        if self.game.status != GameStatus::Setup {
            return Err(JoinError::InvalidRoomState);
        }
        if self
            .game
            .players
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&name))
        {
            return Err(JoinError::NameTaken);
        }

        let is_host = self.game.players.is_empty();
        let Some(seat) = rules::add_player(&mut self.game, user_id.clone(), name, is_host) else {
            return Err(JoinError::RoomFull);
        };
        self.writers.insert(user_id, writer);
        self.metrics.increment_players_joined();
        self.maybe_autostart();
        self.broadcast_state();
        Ok(seat)
    }

    async fn handle_action(&mut self, user_id: PlayerId, message: ClientMessage) {
        let Some(player) = self.game.player_by_id(&user_id) else {
            return;
        };
        if player.is_removed {
            return;
        }

        let outcome = match message {
            ClientMessage::Auth { .. } => ActionOutcome::NoOp,
            ClientMessage::StartGame => {
                if player.is_host {
                    let outcome = rules::start_game(&mut self.game);
                    if outcome == ActionOutcome::StateChanged {
                        self.turn_controller = Some(TurnController::spawn(self.inbox.clone()));
                    }
                    outcome
                } else {
                    ActionOutcome::NoOp
                }
            }
            ClientMessage::RollDice => rules::initiate_roll(&mut self.game, &user_id),
            ClientMessage::MovePiece { piece_id } => {
                let events_before = self.game.turn_log.len();
                let outcome = rules::move_piece(&mut self.game, &user_id, piece_id);
                self.record_move_metrics(events_before);
                outcome
            }
            ClientMessage::LeaveGame => {
                let seat = self.game.seat_of(&user_id);
                match seat {
                    Some(seat) => rules::leave_game(&mut self.game, seat),
                    None => ActionOutcome::NoOp,
                }
            }
            ClientMessage::SendChatMessage { text } => {
                self.handle_chat(&user_id, text).await;
                ActionOutcome::StateChanged
            }
        };

        self.apply_outcome(outcome).await;
    }

    async fn handle_chat(&mut self, user_id: &PlayerId, text: String) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let Some(player) = self.game.player_by_id(user_id) else {
            return;
        };
        let entry = ChatEntry {
            player_id: user_id.clone(),
            name: player.name.clone(),
            text: trimmed.to_string(),
            at: self.ports.clock.now(),
        };
        self.persist_chat(&entry).await;
        self.game.push_chat(entry);
        self.metrics.increment_chat_messages();
    }

    async fn apply_outcome(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::NoOp => {}
            ActionOutcome::RollInitiated => {
                self.broadcast_state();
                turn_controller::schedule(
                    self.inbox.clone(),
                    Duration::from_millis(self.config.server.roll_resolution_delay_ms),
                    RoomCommand::ResolveRoll,
                );
            }
            ActionOutcome::RollResolvedNoMove => {
                self.persist_turn_log_tail().await;
                self.broadcast_state();
                turn_controller::schedule(
                    self.inbox.clone(),
                    Duration::from_millis(self.config.server.penalty_display_delay_ms),
                    RoomCommand::AdvanceAfterNoMove,
                );
            }
            ActionOutcome::StateChanged => {
                self.persist_turn_log_tail().await;
                self.broadcast_state();
            }
            ActionOutcome::GameFinished => {
                self.persist_turn_log_tail().await;
                self.metrics.increment_games_won();
                if let Some(tc) = self.turn_controller.take() {
                    tc.stop();
                }
                self.broadcast_state();
            }
        }
    }

    async fn handle_tick(&mut self) {
        if self.game.status != GameStatus::Playing || self.game.is_rolling || self.game.dice.is_some() {
            return;
        }
        if self.game.turn_seconds_left == 0 {
            return;
        }
        self.game.turn_seconds_left -= 1;
        if self.game.turn_seconds_left == 0 {
            self.metrics.increment_turns_missed();
            let outcome = rules::handle_missed_turn(&mut self.game);
            self.apply_outcome(outcome).await;
        } else if self.game.turn_seconds_left % u32::try_from(self.config.server.broadcast_tick_secs.max(1)).unwrap_or(5) == 0 {
            self.broadcast_state();
        }
    }

    async fn handle_resolve_roll(&mut self) {
        if self.game.status != GameStatus::Playing || !self.game.is_rolling {
            return;
        }
        let outcome = rules::complete_roll(&mut self.game, self.ports.random.as_ref());
        self.metrics.increment_turns_advanced();
        self.apply_outcome(outcome).await;
    }

    async fn handle_advance_after_no_move(&mut self) {
        if self.game.status != GameStatus::Playing || self.game.dice.is_some() {
            return;
        }
        rules::advance_seat(&mut self.game);
        self.persist_turn_log_tail().await;
        self.broadcast_state();
    }

    async fn handle_autostart(&mut self) {
        if self.game.status != GameStatus::Setup
            || self.game.players.len() != self.game.max_players as usize
        {
            return;
        }
        let outcome = rules::start_game(&mut self.game);
        if outcome == ActionOutcome::StateChanged {
            self.turn_controller = Some(TurnController::spawn(self.inbox.clone()));
        }
        self.apply_outcome(outcome).await;
    }

    async fn handle_leave(&mut self, user_id: PlayerId) {
        self.writers.remove(&user_id);
        let Some(player) = self.game.player_by_id_mut(&user_id) else {
            return;
        };
        if player.is_removed {
            return;
        }
        player.disconnected = true;
        self.metrics.increment_players_left();

        if self.config.server.enable_reconnection && self.game.status != GameStatus::Finished {
            self.broadcast_state();
            self.metrics.increment_reconnection_sessions_active();
            let handle = turn_controller::schedule(
                self.inbox.clone(),
                Duration::from_secs(self.config.server.reconnect_grace_secs),
                RoomCommand::PruneDisconnect { user_id: user_id.clone() },
            );
            self.pending_prunes.insert(user_id, handle);
        } else {
            let seat = self.game.seat_of(&user_id);
            if let Some(seat) = seat {
                let outcome = rules::leave_game(&mut self.game, seat);
                self.apply_outcome(outcome).await;
            }
        }
    }

    async fn handle_prune_disconnect(&mut self, user_id: PlayerId) {
        self.pending_prunes.remove(&user_id);
        let Some(player) = self.game.player_by_id(&user_id) else {
            return;
        };
        if !player.disconnected {
            return;
        }
        self.metrics.decrement_reconnection_sessions_active();
        if let Some(seat) = self.game.seat_of(&user_id) {
            self.metrics.increment_players_forfeited_for_inactivity();
            let outcome = rules::leave_game(&mut self.game, seat);
            self.apply_outcome(outcome).await;
        }
    }

    /// Inspects turn events appended by a `MovePiece` action and records
    /// the piece-moved/piece-captured counters the events imply.
    fn record_move_metrics(&self, events_before: usize) {
        for event in &self.game.turn_log[events_before..] {
            match event {
                TurnEvent::PieceMoved { .. } => self.metrics.increment_pieces_moved(),
                TurnEvent::Captured { .. } => self.metrics.increment_pieces_captured(),
                _ => {}
            }
        }
    }

    fn maybe_autostart(&mut self) {
        if self.game.room_type != RoomType::Tournament {
            return;
        }
        if self.game.status != GameStatus::Setup
            || self.game.players.len() != self.game.max_players as usize
        {
            return;
        }
        let delay_secs = self.ports.random.int_in_range(
            u32::try_from(self.config.server.tournament_autostart_min_delay_secs).unwrap_or(2),
            u32::try_from(self.config.server.tournament_autostart_max_delay_secs).unwrap_or(10),
        );
        turn_controller::schedule(
            self.inbox.clone(),
            Duration::from_secs(u64::from(delay_secs)),
            RoomCommand::AutoStart,
        );
    }

    async fn persist_chat(&self, entry: &ChatEntry) {
        let Some(tournament_id) = &self.game.tournament_id else {
            return;
        };
        let result = retry::retry_storage_operation(
            "append_chat",
            || async { self.ports.persistence.append_chat(tournament_id, entry).await.map_err(anyhow::Error::from) },
            Some(Arc::clone(&self.metrics)),
        )
        .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist chat entry after retries, continuing");
        }
    }

    /// Best-effort persistence of the most recently appended turn event.
    /// Invoked after state has already been computed: a failure here is
    /// logged and swallowed, never rolled back.
    async fn persist_turn_log_tail(&self) {
        let Some(tournament_id) = &self.game.tournament_id else {
            return;
        };
        let Some(event) = self.game.turn_log.last() else {
            return;
        };
        let result = retry::retry_storage_operation(
            "append_turn_event",
            || async { self.ports.persistence.append_turn_event(tournament_id, event).await.map_err(anyhow::Error::from) },
            Some(Arc::clone(&self.metrics)),
        )
        .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to persist turn event after retries, continuing");
        }
    }

    fn broadcast_state(&mut self) {
        let message = Arc::new(ServerMessage::GameStateUpdate { game: Box::new(self.game.clone()) });
        self.writers.retain(|player_id, writer| match writer.try_send(message.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.increment_websocket_messages_dropped();
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(player_id = %player_id, "pruning dead writer");
                false
            }
        });
    }

    fn publish_meta(&self) {
        self.meta_tx.send_if_modified(|meta| {
            let connected = self.writers.len();
            let finished_at = if self.game.status == GameStatus::Finished {
                Some(meta.finished_at.unwrap_or_else(Instant::now))
            } else {
                None
            };
            let emptied_at = if connected == 0 {
                Some(meta.emptied_at.unwrap_or_else(Instant::now))
            } else {
                None
            };
            let changed = meta.status != self.game.status
                || meta.connected_players != connected
                || meta.finished_at.is_some() != finished_at.is_some()
                || meta.emptied_at.is_some() != emptied_at.is_some();
            meta.status = self.game.status;
            meta.connected_players = connected;
            meta.finished_at = finished_at;
            meta.emptied_at = emptied_at;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{InMemoryPersistence, SystemClock, SystemRandom};
    use std::sync::Arc;

    fn test_ports() -> Arc<Ports> {
        Arc::new(Ports {
            clock: Arc::new(SystemClock),
            identity: Arc::new(crate::ports::InMemoryIdentity::new()),
            persistence: Arc::new(InMemoryPersistence::new()),
            random: Arc::new(SystemRandom),
        })
    }

    fn test_handle() -> RoomHandle {
        spawn_room(
            GameCode::parse("ABCD").unwrap(),
            RoomType::Manual,
            2,
            "p1".to_string(),
            None,
            test_ports(),
            Arc::new(Config::default()),
            Arc::new(ServerMetrics::new()),
        )
    }

    #[tokio::test]
    async fn first_joiner_becomes_host_and_is_seated() {
        let handle = test_handle();
        let (tx, mut rx) = mpsc::channel(8);
        let result = handle.join("p1".to_string(), "Alice".to_string(), tx).await;
        assert!(result.is_ok());

        let message = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("broadcast within timeout")
            .expect("writer not closed");
        match &*message {
            ServerMessage::GameStateUpdate { game } => {
                assert_eq!(game.players.len(), 1);
                assert!(game.players[0].is_host);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn room_fills_then_start_game_transitions_to_playing() {
        let handle = test_handle();
        let (tx1, mut rx1) = mpsc::channel(16);
        let (tx2, _rx2) = mpsc::channel(16);
        handle.join("p1".to_string(), "Alice".to_string(), tx1).await.unwrap();
        handle.join("p2".to_string(), "Bob".to_string(), tx2).await.unwrap();
        handle.action("p1".to_string(), ClientMessage::StartGame).await;

        let mut saw_playing = false;
        for _ in 0..4 {
            let message = tokio::time::timeout(Duration::from_secs(1), rx1.recv())
                .await
                .expect("broadcast within timeout")
                .expect("writer not closed");
            if let ServerMessage::GameStateUpdate { game } = &*message {
                if game.status == GameStatus::Playing {
                    saw_playing = true;
                    break;
                }
            }
        }
        assert!(saw_playing, "expected a Playing snapshot after StartGame");
    }

    #[tokio::test]
    async fn non_host_cannot_start_game() {
        let handle = test_handle();
        let (tx1, mut rx1) = mpsc::channel(16);
        let (tx2, _rx2) = mpsc::channel(16);
        handle.join("p1".to_string(), "Alice".to_string(), tx1).await.unwrap();
        handle.join("p2".to_string(), "Bob".to_string(), tx2).await.unwrap();
        // Drain the two join broadcasts.
        let _ = tokio::time::timeout(Duration::from_secs(1), rx1.recv()).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), rx1.recv()).await;

        handle.action("p2".to_string(), ClientMessage::StartGame).await;
        let nothing = tokio::time::timeout(Duration::from_millis(200), rx1.recv()).await;
        assert!(nothing.is_err(), "non-host StartGame must not broadcast");
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let handle = test_handle();
        let (tx1, _rx1) = mpsc::channel(16);
        let (tx2, _rx2) = mpsc::channel(16);
        handle.join("p1".to_string(), "Alice".to_string(), tx1).await.unwrap();
        let result = handle.join("p2".to_string(), "alice".to_string(), tx2).await;
        assert_eq!(result, Err(JoinError::NameTaken));
    }
}
