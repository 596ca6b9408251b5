//! The Ludo rule engine: given a game state and an action, computes the next
//! state. No I/O, no timers; deterministic except for dice generation, which
//! is injected through the [`Random`](crate::ports::Random) port.

use chrono::{DateTime, Utc};

use crate::ports::Random;
use crate::protocol::types::PlayerId;

use super::board::{is_safe_cell, pre_home_cell, start_cell, FINISH_START};
use super::model::{Color, Game, GameStatus, Piece, PieceState, Player, TurnEvent};

pub const TURN_LIMIT_SECONDS: u32 = 30;
pub const MAX_INACTIVE_TURNS: u8 = 5;
pub const PITY_SIX_THRESHOLD: u8 = 4;
pub const THREE_SIXES_LIMIT: u8 = 3;

/// Outcome of applying a command to the game, returned to the caller so the
/// Room Actor can decide what follow-up timers (if any) to schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action was a legal no-op as far as broadcasting is concerned, or
    /// was silently dropped per the error-handling policy.
    NoOp,
    /// State changed; the caller should broadcast a fresh snapshot.
    StateChanged,
    /// A roll was initiated; the caller should schedule `complete_roll` after
    /// the configured resolution delay.
    RollInitiated,
    /// A roll resolved with no legal move or a three-sixes forfeiture; the
    /// caller should schedule `advance_seat` after the penalty display delay.
    RollResolvedNoMove,
    /// The game just finished.
    GameFinished,
}

/// Computes the destination `(position, state)` for a piece moving `d` steps,
/// or `None` if the piece has no legal move with that value.
pub fn compute_move(state: PieceState, position: i32, color: Color, d: u8) -> Option<(i32, PieceState)> {
    let d = i32::from(d);
    match state {
        PieceState::Home => {
            if d == 6 {
                Some((start_cell(color), PieceState::Active))
            } else {
                None
            }
        }
        PieceState::Finished => None,
        PieceState::Active if position < FINISH_START => {
            let dist_to_pre_home = (pre_home_cell(color) - position).rem_euclid(52);
            if d > dist_to_pre_home {
                let index = d - dist_to_pre_home - 1;
                match index {
                    5 => Some((FINISH_START + 5, PieceState::Finished)),
                    0..=4 => Some((FINISH_START + index, PieceState::Active)),
                    _ => None,
                }
            } else {
                let new_pos = (position - 1 + d).rem_euclid(52) + 1;
                Some((new_pos, PieceState::Active))
            }
        }
        PieceState::Active => {
            // Home stretch: position >= FINISH_START
            let new_pos = position + d;
            if new_pos == FINISH_START + 5 {
                Some((new_pos, PieceState::Finished))
            } else if new_pos < FINISH_START + 6 {
                Some((new_pos, PieceState::Active))
            } else {
                None
            }
        }
    }
}

/// The set of piece ids belonging to `player` that have a legal move for `d`.
pub fn movable_pieces(player: &Player, d: u8) -> Vec<u8> {
    player
        .pieces
        .iter()
        .filter(|piece| compute_move(piece.state, piece.position, player.color, d).is_some())
        .map(|piece| piece.id)
        .collect()
}

/// `initiateRoll`: sets `is_rolling` if it is the current player's turn and no
/// dice value is pending.
pub fn initiate_roll(game: &mut Game, player_id: &str) -> ActionOutcome {
    if game.status != GameStatus::Playing {
        return ActionOutcome::NoOp;
    }
    let Some(current) = game.current_player() else {
        return ActionOutcome::NoOp;
    };
    if current.id != player_id || game.dice.is_some() || game.is_rolling {
        return ActionOutcome::NoOp;
    }
    game.is_rolling = true;
    game.touch();
    ActionOutcome::RollInitiated
}

/// `completeRoll`: consumes `is_rolling`, draws a dice value (subject to the
/// pity-six and three-sixes rules), and computes the movable set.
pub fn complete_roll(game: &mut Game, random: &dyn Random) -> ActionOutcome {
    if !game.is_rolling {
        return ActionOutcome::NoOp;
    }
    game.is_rolling = false;

    let seat = game.current_seat;
    let Some(player) = game.players.get_mut(seat) else {
        return ActionOutcome::NoOp;
    };

    let all_home = player.all_pieces_home();
    let value = if all_home && player.rolls_without_six_when_all_home >= PITY_SIX_THRESHOLD {
        6
    } else {
        random.int_in_range(1, 6) as u8
    };

    if value == 6 {
        player.rolls_without_six_when_all_home = 0;
    } else if all_home {
        player.rolls_without_six_when_all_home += 1;
    }

    if value == 6 {
        player.consecutive_sixes += 1;
    } else {
        player.consecutive_sixes = 0;
    }

    game.push_turn_event(TurnEvent::DiceRolled { seat, value });

    if player.consecutive_sixes >= THREE_SIXES_LIMIT {
        player.consecutive_sixes = 0;
        game.dice = None;
        game.movable = Vec::new();
        game.push_turn_event(TurnEvent::PenaltyForfeit { seat });
        game.touch();
        return ActionOutcome::RollResolvedNoMove;
    }

    let movable = movable_pieces(player, value);
    game.dice = Some(value);
    game.movable = movable.clone();
    game.touch();

    if movable.is_empty() {
        ActionOutcome::RollResolvedNoMove
    } else {
        ActionOutcome::StateChanged
    }
}

/// `movePiece`: applies the pending dice value to `piece_id` for the current
/// player, resolves captures, and performs post-move turn arbitration.
pub fn move_piece(game: &mut Game, player_id: &str, piece_id: u8) -> ActionOutcome {
    let Some(dice) = game.dice else {
        return ActionOutcome::NoOp;
    };
    let Some(current) = game.current_player() else {
        return ActionOutcome::NoOp;
    };
    if current.id != player_id || !game.movable.contains(&piece_id) {
        return ActionOutcome::NoOp;
    }

    let seat = game.current_seat;
    let color = current.color;
    let (from, current_state) = {
        let player = &game.players[seat];
        let piece = player.pieces.iter().find(|p| p.id == piece_id).unwrap();
        (piece.position, piece.state)
    };

    let Some((new_pos, new_state)) = compute_move(current_state, from, color, dice) else {
        return ActionOutcome::NoOp;
    };

    {
        let player = &mut game.players[seat];
        if let Some(piece) = player.piece_mut(piece_id) {
            piece.position = new_pos;
            piece.state = new_state;
        }
    }
    game.push_turn_event(TurnEvent::PieceMoved {
        seat,
        piece_id,
        from,
        to: new_pos,
    });

    let mut captured = false;
    if new_pos < FINISH_START && !is_safe_cell(new_pos) {
        captured = apply_capture(game, seat, new_pos);
    }

    let reached_finish = new_state == PieceState::Finished;
    let just_won = reached_finish && {
        let player = &game.players[seat];
        player.pieces.iter().all(|p| p.state == PieceState::Finished)
    };

    if just_won {
        let player = &mut game.players[seat];
        player.has_finished = true;
        let winner_id = player.id.clone();
        game.winner = Some(winner_id.clone());
        game.status = GameStatus::Finished;
        game.dice = None;
        game.movable = Vec::new();
        game.push_turn_event(TurnEvent::GameWon { winner: winner_id });
        game.touch();
        return ActionOutcome::GameFinished;
    }

    let bonus_turn = dice == 6 || captured || reached_finish;
    game.dice = None;
    game.movable = Vec::new();

    if bonus_turn {
        game.turn_seconds_left = TURN_LIMIT_SECONDS;
        game.push_turn_event(TurnEvent::BonusTurn { seat });
        game.touch();
        ActionOutcome::StateChanged
    } else {
        advance_seat(game);
        ActionOutcome::StateChanged
    }
}

/// Sends every opposing piece at `landing_pos` back Home. Returns whether any
/// capture occurred.
fn apply_capture(game: &mut Game, mover_seat: usize, landing_pos: i32) -> bool {
    let mut captured: Vec<(usize, u8)> = Vec::new();
    for (seat, player) in game.players.iter_mut().enumerate() {
        if seat == mover_seat {
            continue;
        }
        for piece in &mut player.pieces {
            if piece.state == PieceState::Active && piece.position == landing_pos {
                piece.state = PieceState::Home;
                piece.position = -1;
                captured.push((seat, piece.id));
            }
        }
    }
    let captured_any = !captured.is_empty();
    for (victim_seat, piece_id) in captured {
        game.push_turn_event(TurnEvent::Captured {
            by_seat: mover_seat,
            victim_seat,
            piece_id,
            at: landing_pos,
        });
    }
    captured_any
}

/// Advances `current_seat` to the next active (non-finished, non-removed)
/// player. If none remain the game ends with no winner.
pub fn advance_seat(game: &mut Game) {
    let n = game.players.len();
    if n == 0 {
        return;
    }
    let from_seat = game.current_seat;
    let mut next = (game.current_seat + 1) % n;
    let mut steps = 0;
    while steps < n && !game.players[next].is_active_seat() {
        next = (next + 1) % n;
        steps += 1;
    }

    if !game.players[next].is_active_seat() {
        game.status = GameStatus::Finished;
        game.winner = None;
        game.dice = None;
        game.movable = Vec::new();
        game.touch();
        return;
    }

    game.current_seat = next;
    let player = &mut game.players[next];
    player.consecutive_sixes = 0;
    game.dice = None;
    game.is_rolling = false;
    game.movable = Vec::new();
    game.turn_seconds_left = TURN_LIMIT_SECONDS;
    game.push_turn_event(TurnEvent::TurnAdvanced {
        from_seat,
        to_seat: next,
    });
    game.touch();
}

/// `handleMissedTurn`: called by the Turn Controller when the countdown
/// reaches zero. Increments the current seat's inactivity counter and either
/// advances the turn or forfeits the seat.
pub fn handle_missed_turn(game: &mut Game) -> ActionOutcome {
    if game.status != GameStatus::Playing {
        return ActionOutcome::NoOp;
    }
    let seat = game.current_seat;
    let Some(player) = game.players.get_mut(seat) else {
        return ActionOutcome::NoOp;
    };
    player.inactive_turns += 1;

    if player.inactive_turns >= MAX_INACTIVE_TURNS {
        leave_game(game, seat)
    } else {
        advance_seat(game);
        ActionOutcome::StateChanged
    }
}

/// `leaveGame`: marks a seat removed (voluntary leave or inactivity
/// eviction) and resolves win-by-attrition. Idempotent: leaving twice has the
/// same effect as leaving once.
pub fn leave_game(game: &mut Game, seat: usize) -> ActionOutcome {
    let Some(player) = game.players.get_mut(seat) else {
        return ActionOutcome::NoOp;
    };
    if player.is_removed {
        return ActionOutcome::NoOp;
    }
    player.is_removed = true;
    game.push_turn_event(TurnEvent::PlayerForfeited { seat });

    let remaining: Vec<usize> = game
        .players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_active_seat())
        .map(|(i, _)| i)
        .collect();

    if remaining.len() == 1 {
        let winner_id = game.players[remaining[0]].id.clone();
        game.winner = Some(winner_id.clone());
        game.status = GameStatus::Finished;
        game.dice = None;
        game.movable = Vec::new();
        game.push_turn_event(TurnEvent::GameWon { winner: winner_id });
        game.touch();
        return ActionOutcome::GameFinished;
    }

    if remaining.is_empty() {
        game.status = GameStatus::Finished;
        game.winner = None;
        game.touch();
        return ActionOutcome::GameFinished;
    }

    if game.current_seat == seat {
        advance_seat(game);
    }
    game.touch();
    ActionOutcome::StateChanged
}

/// `startGame`: Setup -> Playing. Assigns colors in join order according to
/// the room's player capacity and seeds the turn timer.
pub fn start_game(game: &mut Game) -> ActionOutcome {
    if game.status != GameStatus::Setup || game.players.is_empty() {
        return ActionOutcome::NoOp;
    }
    let seating = Color::seating(game.max_players);
    for (seat, player) in game.players.iter_mut().enumerate() {
        if let Some(&color) = seating.get(seat) {
            player.color = color;
            let base = color.index() * 4;
            for (slot, piece) in player.pieces.iter_mut().enumerate() {
                piece.id = base + slot as u8;
            }
        }
    }
    game.player_order = game.players.iter().map(|p| p.color).collect();
    game.status = GameStatus::Playing;
    game.current_seat = 0;
    game.turn_seconds_left = TURN_LIMIT_SECONDS;
    game.touch();
    ActionOutcome::StateChanged
}

impl Game {
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    #[cfg(test)]
    pub fn touch_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

pub fn add_player(game: &mut Game, id: PlayerId, name: String, is_host: bool) -> Option<usize> {
    if game.status != GameStatus::Setup || game.players.len() >= game.max_players as usize {
        return None;
    }
    let seat = game.players.len();
    let seating = Color::seating(game.max_players);
    let color = seating.get(seat).copied().unwrap_or(Color::Red);
    game.players.push(Player::new(id, name, color, is_host));
    game.touch();
    Some(seat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::model::RoomType;
    use proptest::prelude::*;

    fn two_player_playing_game() -> Game {
        let mut game = Game::new(
            "ABCD".to_string(),
            RoomType::Manual,
            2,
            "p1".to_string(),
            None,
            Utc::now(),
        );
        add_player(&mut game, "p1".to_string(), "Alice".to_string(), true);
        add_player(&mut game, "p2".to_string(), "Bob".to_string(), false);
        start_game(&mut game);
        game
    }

    #[test]
    fn home_piece_moves_only_on_six() {
        assert_eq!(
            compute_move(PieceState::Home, -1, Color::Green, 5),
            None
        );
        assert_eq!(
            compute_move(PieceState::Home, -1, Color::Green, 6),
            Some((1, PieceState::Active))
        );
    }

    #[test]
    fn scenario_lone_home_first_six() {
        let mut game = two_player_playing_game();
        // P1 is Green (seat 0) with all pieces Home.
        let outcome = move_piece_with_dice(&mut game, "p1", 4, 6);
        assert_eq!(outcome, ActionOutcome::StateChanged);
        let piece = game.players[0].pieces.iter().find(|p| p.id == 4).unwrap();
        assert_eq!(piece.position, 1);
        assert_eq!(piece.state, PieceState::Active);
        assert_eq!(game.current_seat, 0, "bonus turn keeps the same seat");
    }

    #[test]
    fn scenario_capture_avoided_on_safe_cell() {
        let mut game = two_player_playing_game();
        game.players[0].pieces[0].state = PieceState::Active;
        game.players[0].pieces[0].position = 10;
        game.players[1].pieces[0].state = PieceState::Active;
        game.players[1].pieces[0].position = 10;

        let outcome = move_piece_with_dice(&mut game, "p1", game.players[0].pieces[0].id, 4);
        assert_eq!(outcome, ActionOutcome::StateChanged);
        // 14 is SAFE: no capture.
        assert_eq!(game.players[1].pieces[0].position, 10);
        assert_eq!(game.players[1].pieces[0].state, PieceState::Active);
    }

    #[test]
    fn scenario_capture_occurs_off_safe_cell() {
        let mut game = two_player_playing_game();
        let piece_id = game.players[0].pieces[0].id;
        game.players[0].pieces[0].state = PieceState::Active;
        game.players[0].pieces[0].position = 10;
        game.players[1].pieces[0].state = PieceState::Active;
        game.players[1].pieces[0].position = 13;

        let outcome = move_piece_with_dice(&mut game, "p1", piece_id, 3);
        assert_eq!(outcome, ActionOutcome::StateChanged);
        assert_eq!(game.players[1].pieces[0].position, -1);
        assert_eq!(game.players[1].pieces[0].state, PieceState::Home);
        assert_eq!(game.current_seat, 0, "capture grants a bonus turn");
    }

    #[test]
    fn scenario_three_sixes_forfeits_turn() {
        let mut game = two_player_playing_game();
        let fixed = FixedRandom::new(vec![6, 6, 6]);
        for _ in 0..2 {
            initiate_roll(&mut game, "p1");
            let outcome = complete_roll(&mut game, &fixed);
            assert_eq!(outcome, ActionOutcome::StateChanged);
            game.dice = None;
            game.movable = Vec::new();
            game.is_rolling = true;
            game.current_seat = 0;
        }
        let outcome = complete_roll(&mut game, &fixed);
        assert_eq!(outcome, ActionOutcome::RollResolvedNoMove);
        assert_eq!(game.dice, None);
        advance_seat(&mut game);
        assert_eq!(game.current_seat, 1);
        assert_eq!(game.players[1].consecutive_sixes, 0);
    }

    #[test]
    fn scenario_inactivity_forfeit_declares_winner() {
        let mut game = two_player_playing_game();
        for _ in 0..MAX_INACTIVE_TURNS {
            let outcome = handle_missed_turn(&mut game);
            if outcome == ActionOutcome::GameFinished {
                break;
            }
        }
        assert!(game.players[0].is_removed);
        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.winner, Some("p2".to_string()));
    }

    #[test]
    fn scenario_leave_declares_winner() {
        let mut game = two_player_playing_game();
        let outcome = leave_game(&mut game, 1);
        assert_eq!(outcome, ActionOutcome::GameFinished);
        assert!(game.players[1].is_removed);
        assert_eq!(game.winner, Some("p1".to_string()));
        assert_eq!(game.status, GameStatus::Finished);
    }

    #[test]
    fn scenario_leave_is_idempotent() {
        let mut game = two_player_playing_game();
        leave_game(&mut game, 1);
        let second = leave_game(&mut game, 1);
        assert_eq!(second, ActionOutcome::NoOp);
    }

    #[test]
    fn scenario_finish_with_no_extra_turn_needed() {
        let mut game = two_player_playing_game();
        let piece_id = game.players[0].pieces[0].id;
        for piece in game.players[0].pieces.iter_mut().skip(1) {
            piece.state = PieceState::Finished;
            piece.position = FINISH_START + 5;
        }
        game.players[0].pieces[0].state = PieceState::Active;
        game.players[0].pieces[0].position = FINISH_START + 4;

        let outcome = move_piece_with_dice(&mut game, "p1", piece_id, 1);
        assert_eq!(outcome, ActionOutcome::GameFinished);
        assert!(game.players[0].has_finished);
        assert_eq!(game.winner, Some("p1".to_string()));
        assert_eq!(game.status, GameStatus::Finished);
    }

    #[test]
    fn pity_six_forces_a_six_after_four_non_six_rolls_while_all_home() {
        let mut game = two_player_playing_game();
        game.players[0].rolls_without_six_when_all_home = PITY_SIX_THRESHOLD;
        initiate_roll(&mut game, "p1");
        let fixed = FixedRandom::new(vec![3]);
        complete_roll(&mut game, &fixed);
        assert_eq!(game.dice, Some(6));
    }

    fn move_piece_with_dice(game: &mut Game, player: &str, piece_id: u8, dice: u8) -> ActionOutcome {
        initiate_roll(game, player);
        game.dice = Some(dice);
        game.is_rolling = false;
        let current = game.current_player().unwrap();
        game.movable = movable_pieces(current, dice);
        move_piece(game, player, piece_id)
    }

    struct FixedRandom {
        values: std::sync::Mutex<std::collections::VecDeque<u32>>,
    }

    impl FixedRandom {
        fn new(values: Vec<u32>) -> Self {
            Self {
                values: std::sync::Mutex::new(values.into()),
            }
        }
    }

    impl Random for FixedRandom {
        fn int_in_range(&self, _lo: u32, _hi: u32) -> u32 {
            self.values.lock().unwrap().pop_front().unwrap_or(1)
        }
    }

    proptest! {
        #[test]
        fn compute_move_on_main_path_never_overshoots_finish(position in 1i32..52, d in 1u8..6) {
            if let Some((new_pos, new_state)) = compute_move(PieceState::Active, position, Color::Green, d) {
                match new_state {
                    PieceState::Active => prop_assert!(new_pos >= 1),
                    PieceState::Finished => prop_assert_eq!(new_pos, FINISH_START + 5),
                    PieceState::Home => prop_assert!(false, "active piece cannot move back Home"),
                }
            }
        }
    }
}
