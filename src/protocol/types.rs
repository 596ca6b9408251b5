use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a user, resolved by the Identity port from a bearer token.
pub type PlayerId = String;

/// Default deployment region identifier when one is not configured.
pub const DEFAULT_REGION_ID: &str = "default";

/// An uppercase alphanumeric game code, parsed case-insensitively from the connection path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCode(String);

impl GameCode {
    /// Normalize a raw path segment into a canonical game code.
    ///
    /// Returns `None` if, once trimmed, the value is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<GameCode> for String {
    fn from(code: GameCode) -> Self {
        code.0
    }
}

/// Describes the characters a deployment allows inside a player name; sent to clients
/// so SDKs can validate locally before submitting a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerNameRulesPayload {
    pub max_length: usize,
    pub min_length: usize,
    pub allow_unicode_alphanumeric: bool,
    pub allow_spaces: bool,
    pub allow_leading_trailing_whitespace: bool,
    #[serde(default)]
    pub allowed_symbols: Vec<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_allowed_characters: Option<String>,
}

impl PlayerNameRulesPayload {
    pub fn from_protocol_config(config: &crate::config::ProtocolConfig) -> Self {
        let rules = &config.player_name_validation;
        Self {
            max_length: config.max_player_name_length,
            min_length: 1,
            allow_unicode_alphanumeric: rules.allow_unicode_alphanumeric,
            allow_spaces: rules.allow_spaces,
            allow_leading_trailing_whitespace: rules.allow_leading_trailing_whitespace,
            allowed_symbols: rules.allowed_symbols.clone(),
            additional_allowed_characters: rules.additional_allowed_characters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_code_normalizes_to_uppercase() {
        let code = GameCode::parse("abc123").unwrap();
        assert_eq!(code.as_str(), "ABC123");
    }

    #[test]
    fn game_code_rejects_blank_input() {
        assert!(GameCode::parse("   ").is_none());
    }

    #[test]
    fn game_code_trims_whitespace() {
        let code = GameCode::parse("  wxyz  ").unwrap();
        assert_eq!(code.as_str(), "WXYZ");
    }
}
