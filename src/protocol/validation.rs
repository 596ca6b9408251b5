use crate::config::ProtocolConfig;
use crate::game::model::Player;

pub fn validate_game_code_with_config(code: &str, config: &ProtocolConfig) -> Result<(), String> {
    if code.is_empty() {
        return Err("Game code cannot be empty".to_string());
    }
    if code.len() < config.min_game_code_length || code.len() > config.max_game_code_length {
        return Err(format!(
            "Game code must be between {} and {} characters",
            config.min_game_code_length, config.max_game_code_length
        ));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Game code must be alphanumeric".to_string());
    }
    Ok(())
}

pub fn validate_player_name_with_config(name: &str, config: &ProtocolConfig) -> Result<(), String> {
    if name.is_empty() {
        return Err("Player name cannot be empty".to_string());
    }
    if name.len() > config.max_player_name_length {
        return Err(format!(
            "Player name too long (max {} characters)",
            config.max_player_name_length
        ));
    }

    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Player name cannot be blank".to_string());
    }

    let rules = &config.player_name_validation;
    if !rules.allow_leading_trailing_whitespace && trimmed.len() != name.len() {
        return Err("Player name cannot have leading or trailing whitespace".to_string());
    }

    for ch in name.chars() {
        if ch == ' ' {
            if rules.allow_spaces {
                continue;
            }
            return Err("Player name cannot contain spaces".to_string());
        }

        if ch.is_whitespace() {
            return Err("Player name cannot contain whitespace characters".to_string());
        }

        let is_alphanumeric = if rules.allow_unicode_alphanumeric {
            ch.is_alphanumeric()
        } else {
            ch.is_ascii_alphanumeric()
        };

        if is_alphanumeric || rules.is_allowed_symbol(ch) {
            continue;
        }

        return Err("Player name contains invalid characters".to_string());
    }

    Ok(())
}

pub fn validate_player_name_uniqueness(name: &str, existing_players: &[Player]) -> Result<(), String> {
    let normalized_name = name.to_lowercase();
    for player in existing_players {
        if player.name.to_lowercase() == normalized_name {
            return Err("Player name already exists in this room".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_code_rejects_wrong_length() {
        let cfg = ProtocolConfig::default();
        assert!(validate_game_code_with_config("AB", &cfg).is_err());
        assert!(validate_game_code_with_config("ABCD", &cfg).is_ok());
    }

    #[test]
    fn game_code_rejects_non_alphanumeric() {
        let cfg = ProtocolConfig::default();
        assert!(validate_game_code_with_config("ABC-", &cfg).is_err());
    }

    #[test]
    fn player_name_rejects_empty() {
        let cfg = ProtocolConfig::default();
        assert!(validate_player_name_with_config("", &cfg).is_err());
    }

    #[test]
    fn player_name_rejects_too_long() {
        let cfg = ProtocolConfig::default();
        let long_name = "a".repeat(cfg.max_player_name_length + 1);
        assert!(validate_player_name_with_config(&long_name, &cfg).is_err());
    }
}
