use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::grant::{GrantType, ResponseType};
use crate::utils::{random, scope};

/// How a client authenticates at the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEndpointAuthMethod {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "client_secret_post")]
    ClientSecretPost,
    #[serde(rename = "client_secret_basic")]
    ClientSecretBasic,
}

impl TokenEndpointAuthMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(TokenEndpointAuthMethod::None),
            "client_secret_post" => Some(TokenEndpointAuthMethod::ClientSecretPost),
            "client_secret_basic" => Some(TokenEndpointAuthMethod::ClientSecretBasic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenEndpointAuthMethod::None => "none",
            TokenEndpointAuthMethod::ClientSecretPost => "client_secret_post",
            TokenEndpointAuthMethod::ClientSecretBasic => "client_secret_basic",
        }
    }
}

impl Default for TokenEndpointAuthMethod {
    fn default() -> Self {
        TokenEndpointAuthMethod::ClientSecretBasic
    }
}

/// A registered OAuth2 client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub redirect_uris: HashSet<String>,
    pub grant_types: HashSet<GrantType>,
    pub response_types: HashSet<ResponseType>,
    pub scope: String,
    pub secret: String,
    pub id_issued_at: DateTime<Utc>,
    pub secret_expires_at: DateTime<Utc>,
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,
    /// The owner that registered the client; metadata only, never an
    /// authorization decision
    pub owner_id: Option<Uuid>,
    pub contacts: Vec<String>,
    pub client_uri: Option<String>,
    pub logo_uri: Option<String>,
    pub policy_uri: Option<String>,
    pub tos_uri: Option<String>,
    pub jwks_uri: Option<String>,
    pub jwks: Option<String>,
    pub software_id: Option<String>,
    pub software_version: Option<String>,
}

/// The authenticated-client view handed to services
#[derive(Debug, Clone)]
pub struct ClientCtx {
    pub client_id: Uuid,
    pub name: String,
}

impl Client {
    pub fn has_grant_type(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    pub fn has_response_type(&self, response_type: ResponseType) -> bool {
        self.response_types.contains(&response_type)
    }

    /// Redirect URIs match under byte-for-byte string equality
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.contains(uri)
    }

    /// Reduce a requested scope to what the client is registered for
    pub fn validate_scope(&self, requested: &str) -> String {
        scope::intersect(&self.scope, requested)
    }

    /// Constant-time secret comparison gated on secret expiry
    pub fn validate_secret(&self, secret: &str, now: DateTime<Utc>) -> bool {
        if now >= self.secret_expires_at {
            return false;
        }
        random::constant_time_compare(&self.secret, secret)
    }

    pub fn ctx(&self) -> ClientCtx {
        ClientCtx {
            client_id: self.id,
            name: self.name.clone(),
        }
    }
}
