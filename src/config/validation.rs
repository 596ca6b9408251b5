//! Configuration validation functions.

use super::Config;

/// Validate configuration security and warn about potential credential leaks.
pub fn validate_config_security(config: &Config) -> anyhow::Result<()> {
    let is_prod = is_production_mode();

    if config.security.require_metrics_auth {
        let token_present = config
            .security
            .metrics_auth_token
            .as_ref()
            .map(|t| !t.is_empty())
            .unwrap_or(false);

        if !token_present {
            anyhow::bail!(
                "\nCRITICAL: Metrics authentication is enabled but no credentials are configured!\n\
                 ===================================================================\n\
                 Configure a shared bearer token:\n\
                 export LUDO_SERVER__SECURITY__METRICS_AUTH_TOKEN=\"$(openssl rand -hex 32)\"\n\
                 \n\
                 To disable metrics auth (NOT recommended), set:\n\
                 export LUDO_SERVER__SECURITY__REQUIRE_METRICS_AUTH=false\n\
                 ===================================================================\n"
            );
        }

        if let Some(token) = &config.security.metrics_auth_token {
            if token.len() < 16 {
                eprintln!(
                    "\nWARNING: Metrics auth token is very short ({} chars).\n\
                     Recommended: At least 32 characters for security.\n\
                     Generate a strong token: openssl rand -hex 32\n",
                    token.len()
                );
            }
        }
    } else if is_prod {
        eprintln!(
            "\nSECURITY WARNING: Metrics Authentication Disabled in Production!\n\
             ===================================================================\n\
             Your /metrics endpoint is publicly accessible without authentication.\n\
             This exposes sensitive application data and usage statistics.\n\
             \n\
             To enable metrics authentication:\n\
             export LUDO_SERVER__SECURITY__REQUIRE_METRICS_AUTH=true\n\
             export LUDO_SERVER__SECURITY__METRICS_AUTH_TOKEN=\"$(openssl rand -hex 32)\"\n\
             ===================================================================\n"
        );
    }

    if config.server.tournament_autostart_min_delay_secs
        > config.server.tournament_autostart_max_delay_secs
    {
        anyhow::bail!(
            "server.tournament_autostart_min_delay_secs ({}) must not exceed \
             server.tournament_autostart_max_delay_secs ({})",
            config.server.tournament_autostart_min_delay_secs,
            config.server.tournament_autostart_max_delay_secs
        );
    }

    if config.protocol.min_game_code_length > config.protocol.max_game_code_length {
        anyhow::bail!(
            "protocol.min_game_code_length ({}) must not exceed protocol.max_game_code_length ({})",
            config.protocol.min_game_code_length,
            config.protocol.max_game_code_length
        );
    }

    if config.protocol.max_players_limit > 4 {
        anyhow::bail!(
            "protocol.max_players_limit ({}) exceeds the board's 4-seat ceiling",
            config.protocol.max_players_limit
        );
    }

    config.websocket.validate()?;

    Ok(())
}

/// Detect if we're running in production mode.
///
/// Checks for `LUDO_SERVER__ENVIRONMENT` or generic `PRODUCTION` / `PROD` environment variables.
pub fn is_production_mode() -> bool {
    use std::env;

    if let Ok(mode) = env::var("LUDO_SERVER__ENVIRONMENT") {
        return mode.to_lowercase() == "production" || mode.to_lowercase() == "prod";
    }

    env::var("LUDO_SERVER_PRODUCTION").is_ok()
        || env::var("PRODUCTION").is_ok()
        || env::var("PROD").is_ok()
}
