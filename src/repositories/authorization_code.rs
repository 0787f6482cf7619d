use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::OAuthError;
use crate::models::{AuthorizationCode, CodeExchangeRequest, PendingAuthorization, TokenHint};

/// A consumed code remembered for replay detection
#[derive(Debug, Clone)]
struct ConsumedCode {
    client_id: Uuid,
    owner_id: Uuid,
    /// Hints of tokens issued against this code; revoked on reuse
    issued_tokens: Vec<TokenHint>,
}

#[derive(Default)]
struct CodeState {
    active: HashMap<String, AuthorizationCode>,
    consumed: HashMap<String, ConsumedCode>,
}

/// Consumption failure, carrying the token hints that must be revoked when
/// the failure indicates code reuse
#[derive(Debug)]
pub struct CodeConsumeError {
    pub error: OAuthError,
    pub revoke: Vec<TokenHint>,
}

impl CodeConsumeError {
    fn invalid(message: &str) -> Self {
        Self {
            error: OAuthError::InvalidGrant(message.to_string()),
            revoke: Vec::new(),
        }
    }
}

/// Store of single-use authorization codes
///
/// `consume` removes the code before any validation, so two concurrent
/// consumptions of the same code see at most one success. Consumed codes are
/// remembered so that a replay surfaces the tokens to revoke.
#[derive(Clone, Default)]
pub struct AuthorizationCodeStore {
    state: Arc<RwLock<CodeState>>,
}

impl AuthorizationCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a code for an approved authorization request
    pub async fn issue(
        &self,
        owner_id: Uuid,
        request: &PendingAuthorization,
    ) -> AuthorizationCode {
        let code = AuthorizationCode::new(owner_id, request);
        tracing::debug!(client_id = %code.client_id, owner_id = %owner_id, "authorization code issued");
        self.state
            .write()
            .await
            .active
            .insert(code.code.clone(), code.clone());
        code
    }

    /// Consume a code presented at the token endpoint
    ///
    /// One-shot: the code is removed from the store before its bindings are
    /// checked, so a failed exchange burns it for the legitimate caller too.
    pub async fn consume(
        &self,
        request: &CodeExchangeRequest,
    ) -> Result<AuthorizationCode, CodeConsumeError> {
        let mut state = self.state.write().await;

        let Some(code) = state.active.remove(&request.code) else {
            // Replay of an already-consumed code revokes everything that was
            // issued against it.
            if let Some(consumed) = state.consumed.get(&request.code) {
                tracing::warn!(
                    client_id = %consumed.client_id,
                    owner_id = %consumed.owner_id,
                    "authorization code reuse detected"
                );
                return Err(CodeConsumeError {
                    error: OAuthError::InvalidGrant(
                        "authorization code is invalid or already used".to_string(),
                    ),
                    revoke: consumed.issued_tokens.clone(),
                });
            }
            return Err(CodeConsumeError::invalid(
                "authorization code is invalid or already used",
            ));
        };

        state.consumed.insert(
            code.code.clone(),
            ConsumedCode {
                client_id: code.client_id,
                owner_id: code.owner_id,
                issued_tokens: Vec::new(),
            },
        );

        if let Err(error) = code.validate_exchange(request) {
            tracing::debug!(client_id = %code.client_id, "authorization code exchange rejected");
            return Err(CodeConsumeError {
                error,
                revoke: Vec::new(),
            });
        }

        Ok(code)
    }

    /// Record the tokens minted against a consumed code, so a later replay
    /// can revoke them
    pub async fn record_issued_tokens(&self, code: &str, hints: Vec<TokenHint>) {
        if let Some(consumed) = self.state.write().await.consumed.get_mut(code) {
            consumed.issued_tokens = hints;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResponseType, TokenHintType};
    use chrono::{Duration, Utc};

    fn pending(client_id: Uuid) -> PendingAuthorization {
        PendingAuthorization {
            response_type: ResponseType::Code,
            client_id,
            redirect_uri: "https://app/cb".to_string(),
            scope: "read".to_string(),
            state: Some("xyz".to_string()),
        }
    }

    fn exchange(code: &AuthorizationCode) -> CodeExchangeRequest {
        CodeExchangeRequest {
            code: code.code.clone(),
            client_id: code.client_id,
            redirect_uri: code.redirect_uri.clone(),
        }
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let store = AuthorizationCodeStore::new();
        let code = store.issue(Uuid::new_v4(), &pending(Uuid::new_v4())).await;
        let request = exchange(&code);

        assert!(store.consume(&request).await.is_ok());
        let err = store.consume(&request).await.unwrap_err();
        assert!(matches!(err.error, OAuthError::InvalidGrant(_)));
    }

    #[tokio::test]
    async fn test_replay_returns_issued_tokens_for_revocation() {
        let store = AuthorizationCodeStore::new();
        let code = store.issue(Uuid::new_v4(), &pending(Uuid::new_v4())).await;
        let request = exchange(&code);

        store.consume(&request).await.unwrap();
        store
            .record_issued_tokens(
                &code.code,
                vec![TokenHint::new("at-bytes", Some(TokenHintType::AccessToken))],
            )
            .await;

        let err = store.consume(&request).await.unwrap_err();
        assert_eq!(err.revoke.len(), 1);
        assert_eq!(err.revoke[0].token, "at-bytes");
    }

    #[tokio::test]
    async fn test_failed_validation_still_burns_the_code() {
        let store = AuthorizationCodeStore::new();
        let code = store.issue(Uuid::new_v4(), &pending(Uuid::new_v4())).await;

        let mut bad = exchange(&code);
        bad.redirect_uri = "https://evil/cb".to_string();
        assert!(store.consume(&bad).await.is_err());

        // legitimate caller can no longer exchange it either
        let err = store.consume(&exchange(&code)).await.unwrap_err();
        assert!(matches!(err.error, OAuthError::InvalidGrant(_)));
    }

    #[tokio::test]
    async fn test_consume_rejects_expired_code() {
        let store = AuthorizationCodeStore::new();
        let mut code = store.issue(Uuid::new_v4(), &pending(Uuid::new_v4())).await;
        code.expires_at = Utc::now() - Duration::seconds(1);
        store
            .state
            .write()
            .await
            .active
            .insert(code.code.clone(), code.clone());

        let err = store.consume(&exchange(&code)).await.unwrap_err();
        assert!(matches!(err.error, OAuthError::InvalidGrant(_)));
    }

    #[tokio::test]
    async fn test_unknown_code_has_nothing_to_revoke() {
        let store = AuthorizationCodeStore::new();
        let err = store
            .consume(&CodeExchangeRequest {
                code: "nope".to_string(),
                client_id: Uuid::new_v4(),
                redirect_uri: "https://app/cb".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.revoke.is_empty());
    }
}
