//! Core data model for a single Ludo game: colors, pieces, players, and the
//! full game record that is broadcast to clients as `GAME_STATE_UPDATE`.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::types::PlayerId;

/// The maximum number of chat entries retained per room.
pub const CHAT_HISTORY_LIMIT: usize = 50;

/// A seat color. Discriminants are fixed and independent of join order so that
/// piece ids (`color index * 4 + slot`) are stable for the lifetime of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red = 0,
    Green = 1,
    Blue = 2,
    Yellow = 3,
}

impl Color {
    pub const fn index(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Yellow => 3,
        }
    }

    /// Seat colors for a game, in join order, given its player capacity.
    pub const fn seating(max_players: u8) -> &'static [Color] {
        match max_players {
            2 => &[Self::Green, Self::Blue],
            _ => &[Self::Red, Self::Green, Self::Blue, Self::Yellow],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PieceState {
    Home,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Setup,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Manual,
    Tournament,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// `color_index * 4 + slot`, stable and unique within the game.
    pub id: u8,
    pub state: PieceState,
    /// -1 for Home, 1..=52 on the main path, 100..=105 in the home stretch.
    pub position: i32,
}

impl Piece {
    pub const fn new(id: u8) -> Self {
        Self {
            id,
            state: PieceState::Home,
            position: -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: Color,
    pub pieces: [Piece; 4],
    pub is_host: bool,
    pub has_finished: bool,
    pub is_removed: bool,
    pub disconnected: bool,
    pub inactive_turns: u8,
    pub consecutive_sixes: u8,
    pub rolls_without_six_when_all_home: u8,
}

impl Player {
    pub fn new(id: PlayerId, name: String, color: Color, is_host: bool) -> Self {
        let base = color.index() * 4;
        Self {
            id,
            name,
            color,
            pieces: [
                Piece::new(base),
                Piece::new(base + 1),
                Piece::new(base + 2),
                Piece::new(base + 3),
            ],
            is_host,
            has_finished: false,
            is_removed: false,
            disconnected: false,
            inactive_turns: 0,
            consecutive_sixes: 0,
            rolls_without_six_when_all_home: 0,
        }
    }

    pub fn all_pieces_home(&self) -> bool {
        self.pieces.iter().all(|p| p.state == PieceState::Home)
    }

    pub fn is_active_seat(&self) -> bool {
        !self.has_finished && !self.is_removed
    }

    pub fn piece_mut(&mut self, piece_id: u8) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|p| p.id == piece_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// A structured record of something that happened during a turn, appended to
/// `Game::turn_log` for client display and best-effort persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TurnEvent {
    DiceRolled { seat: usize, value: u8 },
    PieceMoved { seat: usize, piece_id: u8, from: i32, to: i32 },
    Captured { by_seat: usize, victim_seat: usize, piece_id: u8, at: i32 },
    BonusTurn { seat: usize },
    TurnAdvanced { from_seat: usize, to_seat: usize },
    PenaltyForfeit { seat: usize },
    PlayerForfeited { seat: usize },
    GameWon { winner: PlayerId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub code: String,
    pub room_type: RoomType,
    pub max_players: u8,
    pub host_id: PlayerId,
    pub tournament_id: Option<String>,
    pub players: Vec<Player>,
    pub current_seat: usize,
    pub player_order: Vec<Color>,
    pub status: GameStatus,
    pub dice: Option<u8>,
    pub is_rolling: bool,
    pub movable: Vec<u8>,
    pub turn_seconds_left: u32,
    pub winner: Option<PlayerId>,
    pub message: String,
    pub chat: VecDeque<ChatEntry>,
    pub turn_log: Vec<TurnEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new(
        code: String,
        room_type: RoomType,
        max_players: u8,
        host_id: PlayerId,
        tournament_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            room_type,
            max_players,
            host_id,
            tournament_id,
            players: Vec::new(),
            current_seat: 0,
            player_order: Vec::new(),
            status: GameStatus::Setup,
            dice: None,
            is_rolling: false,
            movable: Vec::new(),
            turn_seconds_left: 0,
            winner: None,
            message: String::new(),
            chat: VecDeque::new(),
            turn_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_chat(&mut self, entry: ChatEntry) {
        self.chat.push_back(entry);
        while self.chat.len() > CHAT_HISTORY_LIMIT {
            self.chat.pop_front();
        }
    }

    pub fn push_turn_event(&mut self, event: TurnEvent) {
        self.turn_log.push(event);
    }

    pub fn player_by_id(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_by_id_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn seat_of(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_seat)
    }

    pub fn current_player_mut(&mut self) -> Option<&mut Player> {
        self.players.get_mut(self.current_seat)
    }

    /// Total Finished + Active + Home piece count across all players; must
    /// always equal `4 * players.len()`.
    #[cfg(test)]
    pub fn total_piece_count(&self) -> usize {
        self.players.iter().map(|p| p.pieces.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_ids_are_derived_from_color_index() {
        let p = Player::new("u1".to_string(), "Alice".to_string(), Color::Green, true);
        assert_eq!(p.pieces.map(|piece| piece.id), [4, 5, 6, 7]);
    }

    #[test]
    fn new_player_starts_with_all_pieces_home() {
        let p = Player::new("u1".to_string(), "Alice".to_string(), Color::Red, true);
        assert!(p.all_pieces_home());
        for piece in &p.pieces {
            assert_eq!(piece.state, PieceState::Home);
            assert_eq!(piece.position, -1);
        }
    }

    #[test]
    fn seating_for_two_players_is_green_and_blue() {
        assert_eq!(Color::seating(2), &[Color::Green, Color::Blue]);
    }

    #[test]
    fn seating_for_four_players_is_full_wheel() {
        assert_eq!(
            Color::seating(4),
            &[Color::Red, Color::Green, Color::Blue, Color::Yellow]
        );
    }

    #[test]
    fn chat_ring_buffer_drops_oldest_entries() {
        let mut game = Game::new(
            "ABCD".to_string(),
            RoomType::Manual,
            4,
            "host".to_string(),
            None,
            Utc::now(),
        );
        for i in 0..(CHAT_HISTORY_LIMIT + 10) {
            game.push_chat(ChatEntry {
                player_id: "u1".to_string(),
                name: "Alice".to_string(),
                text: format!("msg {i}"),
                at: Utc::now(),
            });
        }
        assert_eq!(game.chat.len(), CHAT_HISTORY_LIMIT);
        assert_eq!(game.chat.front().unwrap().text, "msg 10");
    }

    #[test]
    fn piece_invariant_total_is_four_times_player_count() {
        let mut game = Game::new(
            "ABCD".to_string(),
            RoomType::Manual,
            4,
            "host".to_string(),
            None,
            Utc::now(),
        );
        game.players.push(Player::new(
            "u1".to_string(),
            "Alice".to_string(),
            Color::Red,
            true,
        ));
        game.players.push(Player::new(
            "u2".to_string(),
            "Bob".to_string(),
            Color::Green,
            false,
        ));
        assert_eq!(game.total_piece_count(), 8);
    }
}
