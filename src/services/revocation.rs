use crate::engine::Engine;
use crate::error::OAuthError;
use crate::models::{TokenHint, TokenHintType, TokenHolder};

/// RFC 7009 token revocation with paired-token cascade
#[derive(Clone)]
pub struct RevocationService {
    engine: Engine,
}

impl RevocationService {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Revoke a token by hint
    ///
    /// Revoking an access token also drops the refresh token bound to the
    /// same (holder, client) pair; revoking a refresh token also blacklists
    /// its parent access token. Revocation is idempotent and unknown tokens
    /// succeed silently.
    pub async fn revoke(
        &self,
        token: &str,
        token_type_hint: Option<&str>,
    ) -> Result<(), OAuthError> {
        let hint_type = match token_type_hint {
            Some(s) => Some(TokenHintType::parse(s).ok_or(OAuthError::UnsupportedTokenType)?),
            None => None,
        };
        let hint = TokenHint::new(token, hint_type);

        let unit = self.engine.tokens.get_by_hint(&hint).await;

        self.engine.tokens.blacklist(token).await;
        self.engine.tokens.delete(&hint).await;

        let Some(unit) = unit else {
            // unknown token: nothing to cascade, still a success
            return Ok(());
        };

        let holder = if unit.owner_id == unit.client_id {
            TokenHolder::Client(unit.client_id)
        } else {
            TokenHolder::Owner(unit.owner_id)
        };

        match unit.hint_type {
            TokenHintType::AccessToken => {
                // drop the refresh token paired with this access token
                if let Some(refresh_hint) =
                    self.engine.bindings.get_refresh(holder, unit.client_id).await
                {
                    self.engine.tokens.blacklist(&refresh_hint.token).await;
                    self.engine.tokens.delete(&refresh_hint).await;
                }
                self.engine.bindings.delete_both(holder, unit.client_id).await;
            }
            TokenHintType::RefreshToken => {
                // the parent access token falls with its refresh token
                if let Some(parent) = &unit.parent_token {
                    self.engine.tokens.blacklist(parent).await;
                    self.engine.tokens.delete(&TokenHint::access(parent)).await;
                }
                self.engine.bindings.delete_both(holder, unit.client_id).await;
            }
        }

        tracing::info!(
            client_id = %unit.client_id,
            owner_id = %unit.owner_id,
            flavour = unit.hint_type.as_str(),
            "token revoked"
        );
        Ok(())
    }
}
