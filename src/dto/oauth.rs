//! OAuth2 request and response DTOs
//!
//! Wire shapes for the authorization, token, introspection, revocation and
//! registration endpoints, per RFC 6749, RFC 7662, RFC 7009 and RFC 7591.

use serde::{Deserialize, Serialize};

use crate::error::OAuthError;
use crate::models::{Client, TokenUnit, TOKEN_TYPE_BEARER};

// ============================================================================
// Authorization endpoint
// ============================================================================

/// Query parameters of GET /oauth/authorize
///
/// Everything is optional at the wire level; the validator decides which
/// omission maps to which error channel.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationRequest {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
}

/// Body of POST /oauth/approve: the owner's consent decision
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveRequest {
    pub approved: bool,
    pub client_id: String,
    pub consent_token: String,
}

/// What the consent page renders for the owner
#[derive(Debug, Clone, Serialize)]
pub struct ConsentPromptResponse {
    pub client_id: String,
    pub client_name: String,
    pub redirect_uri: String,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub consent_token: String,
}

// ============================================================================
// Token endpoint
// ============================================================================

/// Form body of POST /oauth/token, covering every grant type
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Successful token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AccessTokenResponse {
    /// Assemble the response for an access token and its optional refresh
    /// token; `state` is echoed only for implicit grants
    pub fn new(
        access: &TokenUnit,
        refresh: Option<&TokenUnit>,
        state: Option<String>,
    ) -> Self {
        Self {
            access_token: access.token.clone(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: access.expires_in(chrono::Utc::now()),
            refresh_token: refresh.map(|t| t.token.clone()),
            scope: if access.scope.is_empty() {
                None
            } else {
                Some(access.scope.clone())
            },
            state,
        }
    }
}

// ============================================================================
// Introspection endpoint (RFC 7662)
// ============================================================================

/// Form body of POST /oauth/introspect
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionRequest {
    pub token: String,
    pub token_type_hint: Option<String>,
}

/// Introspection response; every field except `active` is omitted when its
/// source cannot be resolved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl IntrospectionResponse {
    /// The response for an invalid, expired or revoked token
    pub fn inactive() -> Self {
        Self::default()
    }
}

// ============================================================================
// Revocation endpoint (RFC 7009)
// ============================================================================

/// Form body of POST /oauth/revoke
#[derive(Debug, Clone, Deserialize)]
pub struct RevocationRequest {
    pub token: String,
    pub token_type_hint: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

// ============================================================================
// Dynamic client registration (RFC 7591)
// ============================================================================

/// Body of POST /oauth/clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientRegistrationRequest {
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    pub token_endpoint_auth_method: Option<String>,
    #[serde(default)]
    pub grant_types: Vec<String>,
    #[serde(default)]
    pub response_types: Vec<String>,
    pub client_name: Option<String>,
    pub client_uri: Option<String>,
    pub logo_uri: Option<String>,
    pub scope: Option<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
    pub tos_uri: Option<String>,
    pub policy_uri: Option<String>,
    pub jwks_uri: Option<String>,
    pub jwks: Option<String>,
    pub software_id: Option<String>,
    pub software_version: Option<String>,
}

/// Registration response: the issued identifiers plus the registered metadata
#[derive(Debug, Clone, Serialize)]
pub struct ClientInformationResponse {
    pub client_id: String,
    pub client_secret: String,
    pub client_id_issued_at: i64,
    pub client_secret_expires_at: i64,
    pub redirect_uris: Vec<String>,
    pub token_endpoint_auth_method: String,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tos_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
}

impl From<&Client> for ClientInformationResponse {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.id.to_string(),
            client_secret: client.secret.clone(),
            client_id_issued_at: client.id_issued_at.timestamp(),
            client_secret_expires_at: client.secret_expires_at.timestamp(),
            redirect_uris: client.redirect_uris.iter().cloned().collect(),
            token_endpoint_auth_method: client.token_endpoint_auth_method.as_str().to_string(),
            grant_types: client.grant_types.iter().map(|g| g.as_str().to_string()).collect(),
            response_types: client
                .response_types
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
            client_name: client.name.clone(),
            client_uri: client.client_uri.clone(),
            logo_uri: client.logo_uri.clone(),
            scope: client.scope.clone(),
            contacts: client.contacts.clone(),
            tos_uri: client.tos_uri.clone(),
            policy_uri: client.policy_uri.clone(),
            jwks_uri: client.jwks_uri.clone(),
            jwks: client.jwks.clone(),
            software_id: client.software_id.clone(),
            software_version: client.software_version.clone(),
        }
    }
}

// ============================================================================
// Error response
// ============================================================================

/// RFC 6749 §5.2 error body; `state` is echoed on redirect-channel errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl From<&OAuthError> for OAuthErrorResponse {
    fn from(error: &OAuthError) -> Self {
        Self {
            error: error.wire_code().to_string(),
            error_description: Some(error.to_string()),
            error_uri: None,
            state: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_omits_absent_fields() {
        let response = AccessTokenResponse {
            access_token: "tok".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: None,
            scope: None,
            state: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "tok");
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 3600);
        assert!(json.get("refresh_token").is_none());
        assert!(json.get("scope").is_none());
        assert!(json.get("state").is_none());
    }

    #[test]
    fn test_token_response_includes_refresh_token() {
        let response = AccessTokenResponse {
            access_token: "tok".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 60,
            refresh_token: Some("ref".to_string()),
            scope: Some("read".to_string()),
            state: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["refresh_token"], "ref");
        assert_eq!(json["scope"], "read");
    }

    #[test]
    fn test_inactive_introspection_has_single_field() {
        let json = serde_json::to_value(IntrospectionResponse::inactive()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(json["active"], false);
    }

    #[test]
    fn test_error_response_omits_nulls() {
        let error = OAuthError::UnsupportedTokenType;
        let json = serde_json::to_value(OAuthErrorResponse::from(&error)).unwrap();
        assert_eq!(json["error"], "unsupported_token_type");
        assert!(json.get("error_uri").is_none());
        assert!(json.get("state").is_none());
    }
}
