use crate::dto::oauth::AccessTokenResponse;
use crate::engine::Engine;
use crate::error::OAuthError;
use crate::models::{
    AccessTokenOptions, ClientCtx, CodeExchangeRequest, GrantType, OwnerCtx,
    PendingAuthorization, ResponseType, TokenHint, TokenHintType, TokenHolder, TokenUnit,
};
use crate::utils::scope;

/// Grant-type-dispatched token issuance
///
/// Each public method assembles `AccessTokenOptions` for one grant type and
/// funnels them through the single issuance policy in `issue`.
#[derive(Clone)]
pub struct GrantService {
    engine: Engine,
}

impl GrantService {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Exchange an authorization code for tokens
    ///
    /// The code is consumed one-shot; any failure after it has been located
    /// burns it, and a replay revokes the tokens minted against it.
    pub async fn authorization_code_grant(
        &self,
        client_ctx: &ClientCtx,
        request: &CodeExchangeRequest,
    ) -> Result<AccessTokenResponse, OAuthError> {
        let client = self
            .engine
            .clients
            .get(client_ctx.client_id)
            .await
            .ok_or(OAuthError::InvalidClient)?;

        if request.client_id != client.id {
            return Err(OAuthError::InvalidGrant(
                "client_id does not match the authenticated client".to_string(),
            ));
        }
        if !client.has_grant_type(GrantType::AuthorizationCode)
            || !client.has_response_type(ResponseType::Code)
        {
            return Err(OAuthError::UnauthorizedClient);
        }

        // The presented redirect URI is checked inside consume, against the
        // one the code was issued with; a mismatch still burns the code.
        let code = match self.engine.codes.consume(request).await {
            Ok(code) => code,
            Err(failure) => {
                self.revoke_hints(&failure.revoke).await;
                return Err(failure.error);
            }
        };

        let options = AccessTokenOptions {
            client_id: code.client_id,
            owner_id: code.owner_id,
            scope: code.scope.clone(),
            state: None,
            add_refresh_token: true,
        };
        let (response, hints) = self.issue(options).await?;
        self.engine.codes.record_issued_tokens(&code.code, hints).await;
        tracing::info!(client_id = %code.client_id, owner_id = %code.owner_id, "authorization code exchanged");
        Ok(response)
    }

    /// Issue a token directly from an approved implicit authorization
    ///
    /// Never mints a refresh token; echoes the request's `state`.
    pub async fn implicit_grant(
        &self,
        owner: &OwnerCtx,
        request: &PendingAuthorization,
    ) -> Result<AccessTokenResponse, OAuthError> {
        let client = self
            .engine
            .clients
            .get(request.client_id)
            .await
            .ok_or(OAuthError::UnauthorizedClient)?;

        if !client.has_grant_type(GrantType::Implicit)
            || !client.has_response_type(ResponseType::Token)
            || !client.has_redirect_uri(&request.redirect_uri)
        {
            return Err(OAuthError::UnauthorizedClient);
        }

        let options = AccessTokenOptions {
            client_id: client.id,
            owner_id: owner.owner_id,
            scope: client.validate_scope(&request.scope),
            state: request.state.clone(),
            add_refresh_token: false,
        };
        let (response, _) = self.issue(options).await?;
        Ok(response)
    }

    /// Resource owner password credentials grant
    pub async fn password_grant(
        &self,
        client_ctx: &ClientCtx,
        username: &str,
        password: &str,
        requested_scope: &str,
    ) -> Result<AccessTokenResponse, OAuthError> {
        let client = self
            .engine
            .clients
            .get(client_ctx.client_id)
            .await
            .ok_or(OAuthError::InvalidClient)?;

        if !client.has_grant_type(GrantType::Password)
            || !client.has_response_type(ResponseType::Token)
        {
            return Err(OAuthError::UnauthorizedClient);
        }

        let owner = self
            .engine
            .owners
            .validate(username, password)
            .await
            .ok_or(OAuthError::AccessDenied)?;

        let options = AccessTokenOptions {
            client_id: client.id,
            owner_id: owner.owner_id,
            scope: client.validate_scope(requested_scope),
            state: None,
            add_refresh_token: true,
        };
        let (response, _) = self.issue(options).await?;
        Ok(response)
    }

    /// Client credentials grant: the client is its own resource owner
    pub async fn client_credentials_grant(
        &self,
        client_ctx: &ClientCtx,
        requested_scope: &str,
    ) -> Result<AccessTokenResponse, OAuthError> {
        let client = self
            .engine
            .clients
            .get(client_ctx.client_id)
            .await
            .ok_or(OAuthError::InvalidClient)?;

        if !client.has_grant_type(GrantType::ClientCredentials)
            || !client.has_response_type(ResponseType::Token)
        {
            return Err(OAuthError::UnauthorizedClient);
        }

        let options = AccessTokenOptions {
            client_id: client.id,
            owner_id: client.id,
            scope: client.validate_scope(requested_scope),
            state: None,
            add_refresh_token: false,
        };
        let (response, _) = self.issue(options).await?;
        Ok(response)
    }

    /// Refresh token grant
    ///
    /// An omitted scope keeps the refresh token's scope; a present scope is
    /// intersected down against it, never widened.
    pub async fn refresh_token_grant(
        &self,
        client_ctx: &ClientCtx,
        refresh_token: &str,
        requested_scope: Option<&str>,
    ) -> Result<AccessTokenResponse, OAuthError> {
        let client = self
            .engine
            .clients
            .get(client_ctx.client_id)
            .await
            .ok_or(OAuthError::InvalidClient)?;

        if !client.has_grant_type(GrantType::RefreshToken)
            || !client.has_response_type(ResponseType::Token)
        {
            return Err(OAuthError::UnauthorizedClient);
        }

        let hint = TokenHint::refresh(refresh_token);
        let refresh = self
            .engine
            .tokens
            .validate(&hint)
            .await
            .ok_or_else(|| OAuthError::InvalidGrant("refresh token is invalid".to_string()))?;

        if refresh.hint_type != TokenHintType::RefreshToken {
            return Err(OAuthError::InvalidGrant(
                "presented token is not a refresh token".to_string(),
            ));
        }
        if refresh.client_id != client.id {
            return Err(OAuthError::InvalidGrant(
                "refresh token was not issued to this client".to_string(),
            ));
        }

        let scope = match requested_scope.map(str::trim).filter(|s| !s.is_empty()) {
            Some(requested) => scope::intersect(&refresh.scope, &client.validate_scope(requested)),
            None => refresh.scope.clone(),
        };

        let options = AccessTokenOptions {
            client_id: refresh.client_id,
            owner_id: refresh.owner_id,
            scope,
            state: None,
            add_refresh_token: true,
        };
        let (response, _) = self.issue(options).await?;
        Ok(response)
    }

    /// The issuance policy shared by every grant
    ///
    /// Rotates the refresh binding, reuses a still-valid access token when
    /// the requested scope does not escalate, and mints fresh tokens
    /// otherwise. Returns the hints of every token backing the response so
    /// code grants can record them for reuse revocation.
    async fn issue(
        &self,
        opt: AccessTokenOptions,
    ) -> Result<(AccessTokenResponse, Vec<TokenHint>), OAuthError> {
        let holder = if opt.owner_id == opt.client_id {
            TokenHolder::Client(opt.client_id)
        } else {
            self.engine
                .owners
                .get_by_id(opt.owner_id)
                .await
                .ok_or(OAuthError::UnauthorizedClient)?;
            TokenHolder::Owner(opt.owner_id)
        };

        // the refresh binding is rotated on every issuance
        self.engine.bindings.delete_refresh(holder, opt.client_id).await;

        let mut access: Option<TokenUnit> = None;
        if let Some(hint) = self.engine.bindings.get_access(holder, opt.client_id).await {
            match self.engine.tokens.validate(&hint).await {
                Some(token) => access = Some(token),
                None => self.engine.bindings.delete_access(holder, opt.client_id).await,
            }
        }

        // reuse is allowed only when the requested scope set is a subset of
        // the live token's scope set
        if let Some(token) = &access {
            if !scope::is_subset(&opt.scope, &token.scope) {
                tracing::debug!(
                    client_id = %opt.client_id,
                    owner_id = %opt.owner_id,
                    "scope escalation, re-minting access token"
                );
                self.engine.bindings.delete_access(holder, opt.client_id).await;
                access = None;
            }
        }

        match access {
            Some(access) => {
                if opt.add_refresh_token {
                    let refresh =
                        TokenUnit::new_refresh_for(&access, self.engine.policy.refresh_duration);
                    self.engine.tokens.put(refresh.clone()).await?;
                    self.engine
                        .bindings
                        .put(
                            holder,
                            opt.client_id,
                            Some(access.hint()),
                            Some(refresh.hint()),
                        )
                        .await;
                    let hints = vec![access.hint(), refresh.hint()];
                    Ok((
                        AccessTokenResponse::new(&access, Some(&refresh), opt.state.clone()),
                        hints,
                    ))
                } else {
                    self.engine
                        .bindings
                        .put(holder, opt.client_id, Some(access.hint()), None)
                        .await;
                    let hints = vec![access.hint()];
                    Ok((AccessTokenResponse::new(&access, None, opt.state.clone()), hints))
                }
            }
            None => {
                let (access, refresh) = TokenUnit::new_set(
                    &opt,
                    self.engine.policy.access_duration,
                    self.engine.policy.refresh_duration,
                );
                self.engine.tokens.put(access.clone()).await?;
                if let Some(refresh) = &refresh {
                    self.engine.tokens.put(refresh.clone()).await?;
                }
                self.engine
                    .bindings
                    .put(
                        holder,
                        opt.client_id,
                        Some(access.hint()),
                        refresh.as_ref().map(|r| r.hint()),
                    )
                    .await;

                let mut hints = vec![access.hint()];
                if let Some(refresh) = &refresh {
                    hints.push(refresh.hint());
                }
                tracing::info!(
                    client_id = %opt.client_id,
                    owner_id = %opt.owner_id,
                    scope = %access.scope,
                    "access token minted"
                );
                Ok((
                    AccessTokenResponse::new(&access, refresh.as_ref(), opt.state.clone()),
                    hints,
                ))
            }
        }
    }

    /// Revoke tokens minted against a reused authorization code
    async fn revoke_hints(&self, hints: &[TokenHint]) {
        for hint in hints {
            if let Some(token) = self.engine.tokens.get_by_hint(hint).await {
                let holder = if token.owner_id == token.client_id {
                    TokenHolder::Client(token.client_id)
                } else {
                    TokenHolder::Owner(token.owner_id)
                };
                self.engine.bindings.delete_both(holder, token.client_id).await;
            }
            self.engine.tokens.blacklist(&hint.token).await;
            self.engine.tokens.delete(hint).await;
            tracing::warn!("token revoked after authorization code reuse");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::oauth::ClientRegistrationRequest;
    use crate::engine::test_engine;
    use crate::models::OwnerAttributes;
    use chrono::Duration;
    use uuid::Uuid;

    async fn setup() -> (Engine, GrantService, ClientCtx, OwnerCtx) {
        let engine = test_engine();
        let client = engine
            .clients
            .register(
                &ClientRegistrationRequest {
                    redirect_uris: vec!["https://app/cb".to_string()],
                    token_endpoint_auth_method: Some("client_secret_basic".to_string()),
                    grant_types: vec![
                        "authorization_code".to_string(),
                        "implicit".to_string(),
                        "password".to_string(),
                        "client_credentials".to_string(),
                        "refresh_token".to_string(),
                    ],
                    response_types: vec!["code".to_string(), "token".to_string()],
                    client_name: Some("widget".to_string()),
                    client_uri: None,
                    logo_uri: None,
                    scope: Some("read write".to_string()),
                    contacts: Vec::new(),
                    tos_uri: None,
                    policy_uri: None,
                    jwks_uri: None,
                    jwks: None,
                    software_id: None,
                    software_version: None,
                },
                Duration::hours(1),
                None,
            )
            .await
            .unwrap();
        let owner = engine
            .owners
            .create("alice", "wonderland9!", Vec::new(), OwnerAttributes::default())
            .await
            .unwrap();
        let service = GrantService::new(engine.clone());
        (engine, service, client.ctx(), owner.ctx())
    }

    fn pending(client_id: Uuid, scope: &str) -> PendingAuthorization {
        PendingAuthorization {
            response_type: ResponseType::Code,
            client_id,
            redirect_uri: "https://app/cb".to_string(),
            scope: scope.to_string(),
            state: Some("xyz".to_string()),
        }
    }

    #[tokio::test]
    async fn test_code_grant_happy_path() {
        let (engine, service, client, owner) = setup().await;
        let code = engine
            .codes
            .issue(owner.owner_id, &pending(client.client_id, "read"))
            .await;

        let response = service
            .authorization_code_grant(
                &client,
                &CodeExchangeRequest {
                    code: code.code.clone(),
                    client_id: client.client_id,
                    redirect_uri: "https://app/cb".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.access_token.len(), 32);
        assert_eq!(response.token_type, "Bearer");
        assert!(response.expires_in <= 3600);
        assert!(response.refresh_token.is_some());
        assert_eq!(response.scope.as_deref(), Some("read"));
        assert!(response.state.is_none());
    }

    #[tokio::test]
    async fn test_code_replay_revokes_issued_tokens() {
        let (engine, service, client, owner) = setup().await;
        let code = engine
            .codes
            .issue(owner.owner_id, &pending(client.client_id, "read"))
            .await;
        let request = CodeExchangeRequest {
            code: code.code.clone(),
            client_id: client.client_id,
            redirect_uri: "https://app/cb".to_string(),
        };

        let response = service
            .authorization_code_grant(&client, &request)
            .await
            .unwrap();

        // replaying the code fails and kills the first token pair
        assert!(service.authorization_code_grant(&client, &request).await.is_err());
        let access_hint = TokenHint::access(&response.access_token);
        assert!(engine.tokens.validate(&access_hint).await.is_none());
        assert!(engine.tokens.is_blacklisted(&response.access_token).await);
    }

    #[tokio::test]
    async fn test_code_grant_wrong_redirect_burns_code() {
        let (engine, service, client, owner) = setup().await;
        let code = engine
            .codes
            .issue(owner.owner_id, &pending(client.client_id, "read"))
            .await;

        let err = service
            .authorization_code_grant(
                &client,
                &CodeExchangeRequest {
                    code: code.code.clone(),
                    client_id: client.client_id,
                    redirect_uri: "https://evil/cb".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::InvalidGrant(_)));

        // the mismatch burned the code: the legitimate caller cannot
        // exchange it either
        let err = service
            .authorization_code_grant(
                &client,
                &CodeExchangeRequest {
                    code: code.code,
                    client_id: client.client_id,
                    redirect_uri: "https://app/cb".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::InvalidGrant(_)));
    }

    #[tokio::test]
    async fn test_implicit_grant_has_no_refresh_token() {
        let (_, service, client, owner) = setup().await;
        let mut request = pending(client.client_id, "read");
        request.response_type = ResponseType::Token;

        let response = service.implicit_grant(&owner, &request).await.unwrap();
        assert!(response.refresh_token.is_none());
        assert_eq!(response.state.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn test_password_grant_rejects_bad_credentials() {
        let (_, service, client, _) = setup().await;
        let err = service
            .password_grant(&client, "alice", "wrong", "read")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::AccessDenied));
    }

    #[tokio::test]
    async fn test_subset_scope_reuses_access_token() {
        let (_, service, client, _) = setup().await;
        let first = service
            .password_grant(&client, "alice", "wonderland9!", "read write")
            .await
            .unwrap();
        let second = service
            .password_grant(&client, "alice", "wonderland9!", "read")
            .await
            .unwrap();

        assert_eq!(first.access_token, second.access_token);
        // the refresh token is rotated even on reuse
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn test_scope_escalation_mints_new_token() {
        let (_, service, client, _) = setup().await;
        let first = service
            .password_grant(&client, "alice", "wonderland9!", "read")
            .await
            .unwrap();
        let second = service
            .password_grant(&client, "alice", "wonderland9!", "read write")
            .await
            .unwrap();

        assert_ne!(first.access_token, second.access_token);
        let scope = second.scope.unwrap();
        assert!(scope.contains("read") && scope.contains("write"));
    }

    #[tokio::test]
    async fn test_refresh_rotation_preserves_access() {
        let (engine, service, client, owner) = setup().await;
        let first = service
            .password_grant(&client, "alice", "wonderland9!", "read")
            .await
            .unwrap();
        let refresh_token = first.refresh_token.clone().unwrap();

        let second = service
            .refresh_token_grant(&client, &refresh_token, None)
            .await
            .unwrap();

        assert!(second.refresh_token.is_some());
        assert_ne!(second.refresh_token.as_deref(), Some(refresh_token.as_str()));
        // the returned access token is live
        let hint = TokenHint::access(&second.access_token);
        assert!(engine.tokens.validate(&hint).await.is_some());
        // the binding points at the rotated refresh token
        let bound = engine
            .bindings
            .get_refresh(TokenHolder::Owner(owner.owner_id), client.client_id)
            .await
            .unwrap();
        assert_eq!(bound.token, second.refresh_token.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token_bytes() {
        let (_, service, client, _) = setup().await;
        let first = service
            .password_grant(&client, "alice", "wonderland9!", "read")
            .await
            .unwrap();

        let err = service
            .refresh_token_grant(&client, &first.access_token, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::InvalidGrant(_)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_foreign_client() {
        let (engine, service, client, _) = setup().await;
        let first = service
            .password_grant(&client, "alice", "wonderland9!", "read")
            .await
            .unwrap();

        let other = engine
            .clients
            .register(
                &ClientRegistrationRequest {
                    redirect_uris: vec!["https://other/cb".to_string()],
                    token_endpoint_auth_method: None,
                    grant_types: vec!["refresh_token".to_string()],
                    response_types: vec!["token".to_string()],
                    client_name: None,
                    client_uri: None,
                    logo_uri: None,
                    scope: None,
                    contacts: Vec::new(),
                    tos_uri: None,
                    policy_uri: None,
                    jwks_uri: None,
                    jwks: None,
                    software_id: None,
                    software_version: None,
                },
                Duration::hours(1),
                None,
            )
            .await
            .unwrap();

        let err = service
            .refresh_token_grant(&other.ctx(), &first.refresh_token.unwrap(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::InvalidGrant(_)));
    }

    #[tokio::test]
    async fn test_refresh_narrows_but_never_widens_scope() {
        let (_, service, client, _) = setup().await;
        let first = service
            .password_grant(&client, "alice", "wonderland9!", "read")
            .await
            .unwrap();

        let narrowed = service
            .refresh_token_grant(&client, &first.refresh_token.unwrap(), Some("read write"))
            .await
            .unwrap();
        // "write" was not granted on the refresh token, so it cannot appear
        assert_eq!(narrowed.scope.as_deref(), Some("read"));
    }

    #[tokio::test]
    async fn test_client_credentials_binds_on_client_aggregate() {
        let (engine, service, client, _) = setup().await;
        let response = service
            .client_credentials_grant(&client, "read")
            .await
            .unwrap();

        assert!(response.refresh_token.is_none());
        let bound = engine
            .bindings
            .get_access(TokenHolder::Client(client.client_id), client.client_id)
            .await
            .unwrap();
        assert_eq!(bound.token, response.access_token);
    }

    #[tokio::test]
    async fn test_binding_uniqueness_across_reissue() {
        let (engine, service, client, owner) = setup().await;
        service
            .password_grant(&client, "alice", "wonderland9!", "read")
            .await
            .unwrap();
        service
            .password_grant(&client, "alice", "wonderland9!", "read write")
            .await
            .unwrap();

        // exactly one access and one refresh binding survive
        let holder = TokenHolder::Owner(owner.owner_id);
        assert!(engine.bindings.get_access(holder, client.client_id).await.is_some());
        assert!(engine.bindings.get_refresh(holder, client.client_id).await.is_some());
    }
}
