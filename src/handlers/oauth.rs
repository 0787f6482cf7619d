//! OAuth2 protocol endpoints
//!
//! - GET  /oauth/authorize  - authorization endpoint
//! - POST /oauth/approve    - owner consent decision
//! - POST /oauth/token      - token endpoint
//! - POST /oauth/introspect - RFC 7662 introspection
//! - POST /oauth/revoke     - RFC 7009 revocation

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::dto::oauth::{
    AccessTokenResponse, ApproveRequest, AuthorizationRequest, ConsentPromptResponse,
    IntrospectionRequest, OAuthErrorResponse, RevocationRequest, TokenRequest,
};
use crate::error::{AuthorizeReject, OAuthError};
use crate::handlers::auth::{authenticate_client, authenticate_owner, authenticate_owner_full};
use crate::models::{CodeExchangeRequest, ConsentToken, GrantType, TokenHint, TokenHintType};
use crate::services::{
    AuthorizationService, AuthorizeOutcome, GrantService, IntrospectionService, RevocationService,
};

/// GET /oauth/authorize
///
/// Validates the request for the authenticated owner and parks it in the
/// consent store. The response carries what a consent page would render,
/// plus the one-shot consent token that redeems the decision at
/// POST /oauth/approve.
pub async fn authorize_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(request): Query<AuthorizationRequest>,
) -> Response {
    let owner = match authenticate_owner(&state.engine, &headers).await {
        Ok(owner) => owner,
        Err(error) => return (StatusCode::UNAUTHORIZED, Json(OAuthErrorResponse::from(&error))).into_response(),
    };

    tracing::debug!(owner = %owner.username, "authorization request");

    let service = AuthorizationService::new(state.engine.clone());
    match service.begin(&owner, &request).await {
        Ok(challenge) => {
            let body = ConsentPromptResponse {
                client_id: challenge.request.client_id.to_string(),
                client_name: challenge.client_name,
                redirect_uri: challenge.request.redirect_uri,
                scope: challenge.request.scope,
                state: challenge.request.state,
                consent_token: challenge.consent.token,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(reject) => authorize_reject_response(reject),
    }
}

/// POST /oauth/approve
///
/// Redeems the owner's consent decision and redirects to the client: a code
/// in the query component, or the implicit token response in the fragment.
pub async fn approve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ApproveRequest>,
) -> Response {
    let owner = match authenticate_owner(&state.engine, &headers).await {
        Ok(owner) => owner,
        Err(error) => return (StatusCode::UNAUTHORIZED, Json(OAuthErrorResponse::from(&error))).into_response(),
    };

    let Ok(client_id) = Uuid::parse_str(&request.client_id) else {
        let error = OAuthError::InvalidRequest("client_id is malformed".to_string());
        return (StatusCode::BAD_REQUEST, Json(OAuthErrorResponse::from(&error))).into_response();
    };
    let consent = ConsentToken {
        client_id,
        token: request.consent_token,
    };

    let service = AuthorizationService::new(state.engine.clone());
    match service.approve(&owner, &consent, request.approved).await {
        Ok(AuthorizeOutcome::Code {
            redirect_uri,
            code,
            state,
        }) => {
            let mut location = redirect_uri;
            location.push(if location.contains('?') { '&' } else { '?' });
            location.push_str(&format!("code={}", urlencoding::encode(&code)));
            if let Some(state) = &state {
                location.push_str(&format!("&state={}", urlencoding::encode(state)));
            }
            found(&location)
        }
        Ok(AuthorizeOutcome::Implicit {
            redirect_uri,
            response,
        }) => found(&implicit_fragment(&redirect_uri, &response)),
        Err(reject) => authorize_reject_response(reject),
    }
}

/// POST /oauth/token
pub async fn token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Form(request): axum::Form<TokenRequest>,
) -> Result<Json<AccessTokenResponse>, OAuthError> {
    let client_ctx = authenticate_client(
        &state.engine,
        &headers,
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
    )
    .await?;

    tracing::debug!(
        client_id = %client_ctx.client_id,
        client = %client_ctx.name,
        grant_type = %request.grant_type,
        "token request"
    );

    let grants = GrantService::new(state.engine.clone());
    let response = match GrantType::parse(&request.grant_type) {
        Some(GrantType::AuthorizationCode) => {
            let code = request
                .code
                .ok_or_else(|| OAuthError::InvalidRequest("code is required".to_string()))?;
            let redirect_uri = request.redirect_uri.ok_or_else(|| {
                OAuthError::InvalidRequest("redirect_uri is required".to_string())
            })?;
            // client_id defaults to the authenticated client when omitted
            let client_id = match request.client_id.as_deref() {
                Some(s) => Uuid::parse_str(s)
                    .map_err(|_| OAuthError::InvalidRequest("client_id is malformed".to_string()))?,
                None => client_ctx.client_id,
            };
            grants
                .authorization_code_grant(
                    &client_ctx,
                    &CodeExchangeRequest {
                        code,
                        client_id,
                        redirect_uri,
                    },
                )
                .await?
        }
        Some(GrantType::Password) => {
            let username = request
                .username
                .ok_or_else(|| OAuthError::InvalidRequest("username is required".to_string()))?;
            let password = request
                .password
                .ok_or_else(|| OAuthError::InvalidRequest("password is required".to_string()))?;
            grants
                .password_grant(
                    &client_ctx,
                    &username,
                    &password,
                    request.scope.as_deref().unwrap_or_default(),
                )
                .await?
        }
        Some(GrantType::ClientCredentials) => {
            grants
                .client_credentials_grant(&client_ctx, request.scope.as_deref().unwrap_or_default())
                .await?
        }
        Some(GrantType::RefreshToken) => {
            let refresh_token = request.refresh_token.ok_or_else(|| {
                OAuthError::InvalidRequest("refresh_token is required".to_string())
            })?;
            grants
                .refresh_token_grant(&client_ctx, &refresh_token, request.scope.as_deref())
                .await?
        }
        // implicit is served by the authorization endpoint
        Some(GrantType::Implicit) => return Err(OAuthError::UnauthorizedClient),
        // assertion grants are registered but never served
        Some(grant) if grant.is_assertion() => return Err(OAuthError::UnauthorizedClient),
        Some(_) | None => return Err(OAuthError::UnsupportedGrantType),
    };

    Ok(Json(response))
}

/// POST /oauth/introspect
///
/// Callers are protected resources (authenticated clients) or owners in the
/// admins group.
pub async fn introspect_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Form(request): axum::Form<IntrospectionRequest>,
) -> Result<Json<crate::dto::oauth::IntrospectionResponse>, OAuthError> {
    let authorized = authenticate_client(&state.engine, &headers, None, None).await.is_ok()
        || matches!(
            authenticate_owner_full(&state.engine, &headers).await,
            Ok(owner) if owner.is_admin()
        );
    if !authorized {
        return Err(OAuthError::InvalidClient);
    }

    let hint_type = match request.token_type_hint.as_deref() {
        Some(s) => Some(TokenHintType::parse(s).ok_or(OAuthError::UnsupportedTokenType)?),
        None => None,
    };
    let hint = TokenHint::new(&request.token, hint_type);

    let service = IntrospectionService::new(state.engine.clone());
    Ok(Json(service.introspect(&hint).await))
}

/// POST /oauth/revoke
///
/// Always 200 for valid callers, even when the token is unknown; the only
/// protocol error is an unsupported `token_type_hint`.
pub async fn revoke_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Form(request): axum::Form<RevocationRequest>,
) -> Result<StatusCode, OAuthError> {
    authenticate_client(
        &state.engine,
        &headers,
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
    )
    .await?;

    let service = RevocationService::new(state.engine.clone());
    service
        .revoke(&request.token, request.token_type_hint.as_deref())
        .await?;
    Ok(StatusCode::OK)
}

/// Render an authorization rejection on its designated channel
fn authorize_reject_response(reject: AuthorizeReject) -> Response {
    match reject {
        AuthorizeReject::Direct(error) => {
            (StatusCode::BAD_REQUEST, Json(OAuthErrorResponse::from(&error))).into_response()
        }
        AuthorizeReject::Redirect {
            redirect_uri,
            error,
            state,
        } => {
            let mut location = redirect_uri;
            location.push(if location.contains('?') { '&' } else { '?' });
            location.push_str(&format!("error={}", urlencoding::encode(error.wire_code())));
            if let Some(state) = &state {
                location.push_str(&format!("&state={}", urlencoding::encode(state)));
            }
            found(&location)
        }
    }
}

/// 302 Found with a Location header, the redirect flavour OAuth clients expect
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Build the fragment-encoded redirect for an implicit grant
fn implicit_fragment(redirect_uri: &str, response: &AccessTokenResponse) -> String {
    let mut location = format!(
        "{}#access_token={}&token_type={}&expires_in={}",
        redirect_uri,
        urlencoding::encode(&response.access_token),
        urlencoding::encode(&response.token_type),
        response.expires_in,
    );
    if let Some(scope) = &response.scope {
        location.push_str(&format!("&scope={}", urlencoding::encode(scope)));
    }
    if let Some(state) = &response.state {
        location.push_str(&format!("&state={}", urlencoding::encode(state)));
    }
    location
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_fragment_shape() {
        let response = AccessTokenResponse {
            access_token: "tok".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: None,
            scope: Some("read".to_string()),
            state: Some("s".to_string()),
        };
        let location = implicit_fragment("https://app/cb", &response);
        assert!(location.starts_with("https://app/cb#access_token=tok"));
        assert!(location.contains("token_type=Bearer"));
        assert!(location.contains("expires_in=3600"));
        assert!(location.contains("scope=read"));
        assert!(location.contains("state=s"));
        assert!(!location.contains("refresh_token"));
    }

    #[test]
    fn test_reject_redirect_echoes_state() {
        let reject = AuthorizeReject::Redirect {
            redirect_uri: "https://app/cb".to_string(),
            error: OAuthError::AccessDenied,
            state: Some("xyz".to_string()),
        };
        let response = authorize_reject_response(reject);
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(location, "https://app/cb?error=access_denied&state=xyz");
    }

    #[test]
    fn test_reject_direct_is_bad_request() {
        let reject = AuthorizeReject::Direct(OAuthError::InvalidClientIdentifier);
        let response = authorize_reject_response(reject);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
