//! Identity port: resolves a bearer token to a stable user id and display name.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::types::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub user_id: PlayerId,
    pub display_name: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("token is invalid or unknown")]
    InvalidToken,
    #[error("identity resolution timed out")]
    Timeout,
}

#[async_trait]
pub trait Identity: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<ResolvedUser, IdentityError>;
}

/// In-memory identity resolver: tokens are simply registered ahead of time.
/// Useful for local play, demos, and tests; a real deployment resolves
/// against an auth service instead.
#[derive(Default)]
pub struct InMemoryIdentity {
    tokens: RwLock<HashMap<String, ResolvedUser>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token so that it resolves to the given user. Also accepts
    /// any token of the form `<user_id>:<display_name>` with no prior
    /// registration, so ad-hoc play works without a setup step.
    pub fn register(&self, token: impl Into<String>, user: ResolvedUser) {
        self.tokens.write().unwrap().insert(token.into(), user);
    }
}

#[async_trait]
impl Identity for InMemoryIdentity {
    async fn resolve(&self, token: &str) -> Result<ResolvedUser, IdentityError> {
        if let Some(user) = self.tokens.read().unwrap().get(token).cloned() {
            return Ok(user);
        }

        // Ad-hoc fallback: `user_id:display_name` tokens resolve without
        // pre-registration so a standalone server can be played immediately.
        if let Some((user_id, display_name)) = token.split_once(':') {
            if !user_id.is_empty() && !display_name.is_empty() {
                return Ok(ResolvedUser {
                    user_id: user_id.to_string(),
                    display_name: display_name.to_string(),
                });
            }
        }

        Err(IdentityError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_token_resolves() {
        let identity = InMemoryIdentity::new();
        identity.register(
            "tok-1",
            ResolvedUser {
                user_id: "u1".to_string(),
                display_name: "Alice".to_string(),
            },
        );
        let resolved = identity.resolve("tok-1").await.unwrap();
        assert_eq!(resolved.display_name, "Alice");
    }

    #[tokio::test]
    async fn ad_hoc_token_resolves_without_registration() {
        let identity = InMemoryIdentity::new();
        let resolved = identity.resolve("u42:Bob").await.unwrap();
        assert_eq!(resolved.user_id, "u42");
        assert_eq!(resolved.display_name, "Bob");
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let identity = InMemoryIdentity::new();
        let result = identity.resolve("garbage").await;
        assert_eq!(result, Err(IdentityError::InvalidToken));
    }
}
