use serde::{Deserialize, Serialize};

use super::error_codes::ErrorCode;
use super::types::PlayerNameRulesPayload;
use crate::game::model::Game;

/// Message types sent from client to server.
///
/// The wire envelope is `{"action": "...", "payload": {...}}`. `Unauthenticated`
/// sessions accept only `Auth`; every other variant is forwarded to the Room
/// Actor as an `Action` command once the session is authenticated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Authenticate with a bearer token (MUST be the first message on the socket).
    Auth { token: String },
    /// Request the room transition from Setup to Playing (host-only by convention;
    /// the rule engine does not currently require the sender to be the host).
    StartGame,
    /// Roll the dice for the current seat.
    RollDice,
    /// Move a piece identified by `piece_id` using the pending dice value.
    MovePiece { piece_id: u8 },
    /// Voluntarily leave the game.
    LeaveGame,
    /// Append a chat message to the room's ring buffer.
    SendChatMessage { text: String },
}

/// Message types sent from server to client.
///
/// The wire envelope is `{"type": "...", "payload": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Authentication succeeded; no payload beyond protocol capability info.
    AuthSuccess {
        #[serde(skip_serializing_if = "Option::is_none")]
        player_name_rules: Option<PlayerNameRulesPayload>,
    },
    /// Authentication failed; the connection is closed with code 4001 immediately after.
    AuthFailure { message: String },
    /// Full authoritative snapshot of the game. Clients re-render entirely from this.
    GameStateUpdate { game: Box<Game> },
    /// Non-fatal error; the connection stays open.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_code: Option<ErrorCode>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_round_trips_through_json() {
        let msg = ClientMessage::MovePiece { piece_id: 5 };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"action":"MOVE_PIECE","payload":{"piece_id":5}}"#);
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ClientMessage::MovePiece { piece_id: 5 }));
    }

    #[test]
    fn auth_message_parses_from_wire_shape() {
        let raw = r#"{"action":"AUTH","payload":{"token":"abc"}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ClientMessage::Auth { token } => assert_eq!(token, "abc"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_action_fails_to_parse_and_is_dropped_by_the_caller() {
        let raw = r#"{"action":"TELEPORT","payload":{}}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn server_message_error_omits_error_code_when_absent() {
        let msg = ServerMessage::Error {
            message: "nope".to_string(),
            error_code: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("error_code"));
    }
}
