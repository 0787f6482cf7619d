use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::dto::oauth::OAuthErrorResponse;

/// OAuth2 protocol errors
///
/// The variant names carry the wire identifiers of RFC 6749 §4.1.2.1/§5.2,
/// RFC 7009 §2.2.1 and RFC 7591 §3.2.2. `InvalidClientIdentifier` and
/// `InvalidRedirectionUri` are the two authorization-endpoint failures that
/// MUST NOT be redirected; everything else is surfaced either as JSON or as
/// a redirect, decided by the caller.
#[allow(dead_code)]
#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    #[error("the request is missing a required parameter, includes an invalid parameter value, or is otherwise malformed")]
    InvalidRequest(String),

    #[error("client authentication failed")]
    InvalidClient,

    #[error("the provided authorization grant is invalid, expired, or revoked")]
    InvalidGrant(String),

    #[error("the client is not authorized to request an access token using this method")]
    UnauthorizedClient,

    #[error("the authorization server does not support this grant type")]
    UnsupportedGrantType,

    #[error("the resource owner or authorization server denied the request")]
    AccessDenied,

    #[error("the authorization server does not support obtaining an access token using this method")]
    UnsupportedResponseType,

    #[error("the requested scope is invalid, unknown, or malformed")]
    InvalidScope(String),

    #[error("the authorization server encountered an unexpected condition that prevented it from fulfilling the request")]
    ServerError(String),

    #[error("the authorization server is currently unable to handle the request")]
    TemporarilyUnavailable,

    #[error("client identifier is missing or invalid")]
    InvalidClientIdentifier,

    #[error("missing, invalid, or mismatching redirection URI")]
    InvalidRedirectionUri,

    #[error("the authorization server does not support the revocation of the presented token type")]
    UnsupportedTokenType,

    #[error("the client metadata is invalid or inconsistent")]
    InvalidClientMetadata(String),
}

impl OAuthError {
    /// The RFC wire identifier for this error
    pub fn wire_code(&self) -> &'static str {
        match self {
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::InvalidClient => "invalid_client",
            OAuthError::InvalidGrant(_) => "invalid_grant",
            OAuthError::UnauthorizedClient => "unauthorized_client",
            OAuthError::UnsupportedGrantType => "unsupported_grant_type",
            OAuthError::AccessDenied => "access_denied",
            OAuthError::UnsupportedResponseType => "unsupported_response_type",
            OAuthError::InvalidScope(_) => "invalid_scope",
            OAuthError::ServerError(_) => "server_error",
            OAuthError::TemporarilyUnavailable => "temporarily_unavailable",
            OAuthError::InvalidClientIdentifier => "invalid_client_identifier",
            OAuthError::InvalidRedirectionUri => "invalid_redirection_uri",
            OAuthError::UnsupportedTokenType => "unsupported_token_type",
            OAuthError::InvalidClientMetadata(_) => "invalid_client_metadata",
        }
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            OAuthError::InvalidClient => StatusCode::UNAUTHORIZED,
            OAuthError::AccessDenied => StatusCode::FORBIDDEN,
            OAuthError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OAuthError::TemporarilyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        };

        let body = Json(OAuthErrorResponse::from(&self));

        (status, body).into_response()
    }
}

/// Rejection of an authorization request, tagged by its reporting channel
///
/// Failures detected before the redirect URI is trusted are surfaced to the
/// resource owner in-band; once the client and its redirect URI have been
/// verified, errors travel back to the client as a redirect with the
/// original `state` echoed byte for byte.
#[derive(Debug)]
pub enum AuthorizeReject {
    /// Surfaced in-page as HTTP 400; never redirected
    Direct(OAuthError),

    /// Redirected to the verified redirect URI with `error` and echoed `state`
    Redirect {
        redirect_uri: String,
        error: OAuthError,
        state: Option<String>,
    },
}

impl AuthorizeReject {
    pub fn redirect(redirect_uri: &str, error: OAuthError, state: Option<&str>) -> Self {
        AuthorizeReject::Redirect {
            redirect_uri: redirect_uri.to_string(),
            error,
            state: state.map(String::from),
        }
    }
}

impl From<OAuthError> for AuthorizeReject {
    fn from(error: OAuthError) -> Self {
        AuthorizeReject::Direct(error)
    }
}
