use uuid::Uuid;

use crate::dto::oauth::{AccessTokenResponse, AuthorizationRequest};
use crate::engine::Engine;
use crate::error::{AuthorizeReject, OAuthError};
use crate::models::{ConsentToken, GrantType, OwnerCtx, PendingAuthorization, ResponseType};
use crate::services::grant::GrantService;

/// Outcome of an approved authorization request
#[derive(Debug)]
pub enum AuthorizeOutcome {
    /// Redirect with `code` and echoed `state` in the query component
    Code {
        redirect_uri: String,
        code: String,
        state: Option<String>,
    },
    /// Redirect with the token response in the fragment component
    Implicit {
        redirect_uri: String,
        response: AccessTokenResponse,
    },
}

/// What the consent page needs to render, plus the one-shot token that
/// redeems the owner's decision
#[derive(Debug)]
pub struct ConsentChallenge {
    pub client_name: String,
    pub request: PendingAuthorization,
    pub consent: ConsentToken,
}

/// Validates authorization requests and drives them through consent to a
/// code or an implicit token
#[derive(Clone)]
pub struct AuthorizationService {
    engine: Engine,
    grants: GrantService,
}

impl AuthorizationService {
    pub fn new(engine: Engine) -> Self {
        Self {
            grants: GrantService::new(engine.clone()),
            engine,
        }
    }

    /// Validate an incoming authorization request
    ///
    /// The order is significant: failures in steps 1 and 2 happen before the
    /// redirect URI is trusted and are surfaced in-page; everything after is
    /// tagged with the verified redirect URI and the echoed `state`.
    pub async fn validate(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<PendingAuthorization, AuthorizeReject> {
        // 1. client identifier
        let client_id = request
            .client_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(OAuthError::InvalidClientIdentifier)?;
        let client = self
            .engine
            .clients
            .get(client_id)
            .await
            .ok_or(OAuthError::InvalidClientIdentifier)?;

        // 2. redirection URI, byte-for-byte against the registered set
        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or(OAuthError::InvalidRedirectionUri)?;
        if !client.has_redirect_uri(redirect_uri) {
            return Err(OAuthError::InvalidRedirectionUri.into());
        }

        // From here on the redirect URI is trusted and errors travel back on it.
        let state = request.state.as_deref();

        // 3. response type present
        let Some(response_type) = request.response_type.as_deref().filter(|s| !s.is_empty())
        else {
            return Err(AuthorizeReject::redirect(
                redirect_uri,
                OAuthError::InvalidRequest("response_type is required".to_string()),
                state,
            ));
        };

        // 4.-6. response type against the client's registered capabilities
        let response_type = match ResponseType::parse(response_type) {
            Some(ResponseType::Code)
                if client.has_grant_type(GrantType::AuthorizationCode)
                    && client.has_response_type(ResponseType::Code) =>
            {
                ResponseType::Code
            }
            Some(ResponseType::Token)
                if client.has_grant_type(GrantType::Implicit)
                    && client.has_response_type(ResponseType::Token) =>
            {
                ResponseType::Token
            }
            _ => {
                tracing::debug!(client_id = %client_id, "response type not allowed for client");
                return Err(AuthorizeReject::redirect(
                    redirect_uri,
                    OAuthError::UnauthorizedClient,
                    state,
                ));
            }
        };

        // 7. a missing state is legal but worth flagging
        if state.is_none() {
            tracing::warn!(client_id = %client_id, "authorization request without state parameter");
        }

        // 8. reduce the requested scope to the client's registered scope
        let scope = client.validate_scope(request.scope.as_deref().unwrap_or_default());

        Ok(PendingAuthorization {
            response_type,
            client_id,
            redirect_uri: redirect_uri.to_string(),
            scope,
            state: state.map(String::from),
        })
    }

    /// Validate a request and bind it to a consent token for the owner
    pub async fn begin(
        &self,
        owner: &OwnerCtx,
        request: &AuthorizationRequest,
    ) -> Result<ConsentChallenge, AuthorizeReject> {
        let pending = self.validate(request).await?;
        let client_name = self
            .engine
            .clients
            .get(pending.client_id)
            .await
            .map(|c| c.name)
            .unwrap_or_default();
        let consent = self
            .engine
            .consents
            .put(owner.owner_id, pending.clone())
            .await;
        Ok(ConsentChallenge {
            client_name,
            request: pending,
            consent,
        })
    }

    /// Redeem the owner's consent decision
    ///
    /// The consent token is consumed either way. A denial redirects back to
    /// the client with `access_denied`; an approval issues a code or, for
    /// implicit requests, a token response destined for the fragment.
    pub async fn approve(
        &self,
        owner: &OwnerCtx,
        consent: &ConsentToken,
        approved: bool,
    ) -> Result<AuthorizeOutcome, AuthorizeReject> {
        let pending = self
            .engine
            .consents
            .take(owner.owner_id, consent)
            .await
            .ok_or_else(|| {
                OAuthError::InvalidRequest("no pending authorization for this consent".to_string())
            })?;

        if !approved {
            tracing::info!(
                owner_id = %owner.owner_id,
                client_id = %pending.client_id,
                "owner denied authorization"
            );
            return Err(AuthorizeReject::redirect(
                &pending.redirect_uri,
                OAuthError::AccessDenied,
                pending.state.as_deref(),
            ));
        }

        match pending.response_type {
            ResponseType::Code => {
                let code = self.engine.codes.issue(owner.owner_id, &pending).await;
                Ok(AuthorizeOutcome::Code {
                    redirect_uri: pending.redirect_uri,
                    code: code.code,
                    state: pending.state,
                })
            }
            ResponseType::Token => {
                let response = self
                    .grants
                    .implicit_grant(owner, &pending)
                    .await
                    .map_err(|error| {
                        AuthorizeReject::redirect(
                            &pending.redirect_uri,
                            error,
                            pending.state.as_deref(),
                        )
                    })?;
                Ok(AuthorizeOutcome::Implicit {
                    redirect_uri: pending.redirect_uri,
                    response,
                })
            }
        }
    }
}
