use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::OAuthError;
use crate::models::{TokenHint, TokenUnit};

#[derive(Default)]
struct TokenState {
    /// Access and refresh tokens share one keyspace, keyed by token bytes
    tokens: HashMap<String, TokenUnit>,
    /// Revoked token bytes; permanent within the process retention window
    blacklist: HashSet<String>,
}

/// Store of issued access and refresh tokens
#[derive(Clone, Default)]
pub struct TokenStore {
    state: Arc<RwLock<TokenState>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a token unit
    ///
    /// Blacklisted token bytes are never re-issued.
    pub async fn put(&self, token: TokenUnit) -> Result<(), OAuthError> {
        let mut state = self.state.write().await;
        if state.blacklist.contains(&token.token) {
            return Err(OAuthError::ServerError(
                "token bytes have been blacklisted".to_string(),
            ));
        }
        state.tokens.insert(token.token.clone(), token);
        Ok(())
    }

    /// Look up a token by its bytes
    ///
    /// The hint's flavour is a suggestion only: both flavours live in one
    /// keyspace, so lookup is by bytes regardless of the hint.
    pub async fn get_by_hint(&self, hint: &TokenHint) -> Option<TokenUnit> {
        self.state.read().await.tokens.get(&hint.token).cloned()
    }

    pub async fn delete(&self, hint: &TokenHint) {
        self.state.write().await.tokens.remove(&hint.token);
    }

    /// Validate a token: active, inside [not_before, expires_at) and not
    /// blacklisted
    ///
    /// A token that fails the time check is marked inactive and re-persisted
    /// so later lookups short-circuit.
    pub async fn validate(&self, hint: &TokenHint) -> Option<TokenUnit> {
        let mut state = self.state.write().await;
        if state.blacklist.contains(&hint.token) {
            return None;
        }
        let token = state.tokens.get_mut(&hint.token)?;
        if !token.active {
            return None;
        }
        if !token.in_time_window(Utc::now()) {
            token.active = false;
            tracing::debug!(client_id = %token.client_id, "token expired, marked inactive");
            return None;
        }
        Some(token.clone())
    }

    /// Permanently blacklist token bytes
    pub async fn blacklist(&self, token_bytes: &str) {
        self.state
            .write()
            .await
            .blacklist
            .insert(token_bytes.to_string());
    }

    pub async fn is_blacklisted(&self, token_bytes: &str) -> bool {
        self.state.read().await.blacklist.contains(token_bytes)
    }
}
