use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for structured error handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    Unauthorized,
    InvalidToken,
    AuthenticationRequired,
    AuthenticationTimeout,

    // Validation errors (2xxx)
    InvalidInput,
    InvalidGameCode,
    InvalidPlayerName,
    MessageTooLarge,

    // Room errors (3xxx)
    RoomNotFound,
    RoomFull,
    TournamentNotActive,
    TournamentCompleted,
    InvalidRoomState,

    // Turn / rule errors (4xxx)
    NotYourTurn,
    InvalidMove,
    GameNotInProgress,

    // Rate limiting (5xxx)
    RateLimitExceeded,
    TooManyConnections,

    // Reconnection errors (6xxx)
    ReconnectionFailed,
    ReconnectionTokenInvalid,
    ReconnectionExpired,
    PlayerAlreadyConnected,

    // Server errors (9xxx)
    InternalError,
    StorageError,
    ServiceUnavailable,
}

impl ErrorCode {
    /// Returns a human-readable description of this error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unauthorized => {
                "Access denied. Authentication credentials are missing or invalid."
            }
            Self::InvalidToken => {
                "The authentication token is invalid, malformed, or has expired. Please obtain a new token."
            }
            Self::AuthenticationRequired => {
                "This operation requires authentication. Please provide valid credentials."
            }
            Self::AuthenticationTimeout => {
                "Authentication took too long to complete. Please try again."
            }
            Self::InvalidInput => {
                "The provided input is invalid or malformed. Check your request parameters."
            }
            Self::InvalidGameCode => {
                "The game code is invalid or malformed. Game codes must follow the required format."
            }
            Self::InvalidPlayerName => {
                "The player name is invalid. Player names must be non-empty and meet length requirements."
            }
            Self::MessageTooLarge => {
                "The message size exceeds the maximum allowed limit. Please send a smaller message."
            }
            Self::RoomNotFound => {
                "The requested room could not be found. It may have been closed or the code is incorrect."
            }
            Self::RoomFull => {
                "The room has reached its maximum player capacity. Try joining a different room."
            }
            Self::TournamentNotActive => {
                "The tournament for this code is not currently active."
            }
            Self::TournamentCompleted => {
                "The tournament for this code has already completed."
            }
            Self::InvalidRoomState => {
                "The room is in an invalid state for this operation. Try refreshing or rejoining the room."
            }
            Self::NotYourTurn => "It is not your turn to act.",
            Self::InvalidMove => "That piece cannot move with the current dice value.",
            Self::GameNotInProgress => "The game is not currently in progress.",
            Self::RateLimitExceeded => {
                "Too many requests in a short time. Please slow down and try again later."
            }
            Self::TooManyConnections => {
                "You have too many active connections. Close some connections before opening new ones."
            }
            Self::ReconnectionFailed => {
                "Failed to reconnect to the room. The session may have expired or the room may be closed."
            }
            Self::ReconnectionTokenInvalid => {
                "The reconnection token is invalid or malformed. You may need to join the room again."
            }
            Self::ReconnectionExpired => {
                "The reconnection window has expired. You must join the room again as a new player."
            }
            Self::PlayerAlreadyConnected => {
                "This player is already connected to the room from another session."
            }
            Self::InternalError => {
                "An internal server error occurred. Please try again or contact support if the issue persists."
            }
            Self::StorageError => {
                "A storage error occurred while processing your request. Please try again later."
            }
            Self::ServiceUnavailable => {
                "The service is temporarily unavailable. Please try again in a few moments."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_description() {
        let error = ErrorCode::RoomNotFound;
        let display_output = format!("{}", error);
        let description_output = error.description();
        assert_eq!(display_output, description_output);
    }

    #[test]
    fn test_serialization_unchanged() {
        let error = ErrorCode::RoomNotFound;
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, "\"ROOM_NOT_FOUND\"");
    }

    #[test]
    fn test_not_your_turn_description() {
        assert!(ErrorCode::NotYourTurn.description().contains("turn"));
    }
}
