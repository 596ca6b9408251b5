//! Protocol configuration: game code shape and player name validation.

use super::defaults::{
    default_allow_leading_trailing_whitespace, default_allow_spaces_in_player_names,
    default_allow_unicode_player_names, default_allowed_player_name_symbols,
    default_max_game_code_length, default_max_player_name_length, default_max_players_limit,
    default_min_game_code_length,
};
use serde::{Deserialize, Serialize};

/// Protocol configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProtocolConfig {
    /// Minimum accepted length for a game code.
    #[serde(default = "default_min_game_code_length")]
    pub min_game_code_length: usize,
    /// Maximum accepted length for a game code.
    #[serde(default = "default_max_game_code_length")]
    pub max_game_code_length: usize,
    /// Maximum length for player names.
    #[serde(default = "default_max_player_name_length")]
    pub max_player_name_length: usize,
    /// Maximum number of seats allowed in a room (hard ceiling: 4).
    #[serde(default = "default_max_players_limit")]
    pub max_players_limit: u8,
    /// Player name validation rules.
    #[serde(default)]
    pub player_name_validation: PlayerNameValidationConfig,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            min_game_code_length: default_min_game_code_length(),
            max_game_code_length: default_max_game_code_length(),
            max_player_name_length: default_max_player_name_length(),
            max_players_limit: default_max_players_limit(),
            player_name_validation: PlayerNameValidationConfig::default(),
        }
    }
}

/// Player name validation configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlayerNameValidationConfig {
    /// Allow non-ASCII letters/digits (Unicode alphanumerics)
    #[serde(default = "default_allow_unicode_player_names")]
    pub allow_unicode_alphanumeric: bool,
    /// Permit spaces between words (internal spaces only by default)
    #[serde(default = "default_allow_spaces_in_player_names")]
    pub allow_spaces: bool,
    /// Permit leading or trailing whitespace (still trimmed when checking emptiness)
    #[serde(default = "default_allow_leading_trailing_whitespace")]
    pub allow_leading_trailing_whitespace: bool,
    /// Symbol characters that are always allowed in addition to alphanumeric chars
    #[serde(default = "default_allowed_player_name_symbols")]
    pub allowed_symbols: Vec<char>,
    /// Optional string of additional characters that should be accepted
    #[serde(default)]
    pub additional_allowed_characters: Option<String>,
}

impl Default for PlayerNameValidationConfig {
    fn default() -> Self {
        Self {
            allow_unicode_alphanumeric: default_allow_unicode_player_names(),
            allow_spaces: default_allow_spaces_in_player_names(),
            allow_leading_trailing_whitespace: default_allow_leading_trailing_whitespace(),
            allowed_symbols: default_allowed_player_name_symbols(),
            additional_allowed_characters: None,
        }
    }
}

impl PlayerNameValidationConfig {
    pub fn is_allowed_symbol(&self, ch: char) -> bool {
        if self.allowed_symbols.contains(&ch) {
            return true;
        }
        if let Some(extra) = &self.additional_allowed_characters {
            return extra.chars().any(|extra_ch| extra_ch == ch);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_symbols_allow_dash_and_underscore() {
        let config = PlayerNameValidationConfig::default();
        assert!(config.is_allowed_symbol('-'));
        assert!(config.is_allowed_symbol('_'));
        assert!(!config.is_allowed_symbol('@'));
    }

    #[test]
    fn additional_allowed_characters_extend_the_set() {
        let config = PlayerNameValidationConfig {
            additional_allowed_characters: Some("@#".to_string()),
            ..Default::default()
        };
        assert!(config.is_allowed_symbol('@'));
        assert!(config.is_allowed_symbol('#'));
        assert!(!config.is_allowed_symbol('!'));
    }
}
