use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OAuthError;
use crate::models::consent::PendingAuthorization;
use crate::utils::random;

/// Lifetime of an authorization code
pub const CODE_LIFETIME_MINUTES: i64 = 10;

/// A single-use authorization code bound to client, redirect URI and owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: Uuid,
    pub owner_id: Uuid,
    /// Echoed at exchange time and compared byte for byte
    pub redirect_uri: String,
    pub scope: String,
    pub state: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// The token-endpoint exchange request for an authorization code
#[derive(Debug, Clone)]
pub struct CodeExchangeRequest {
    pub code: String,
    pub client_id: Uuid,
    pub redirect_uri: String,
}

impl AuthorizationCode {
    /// Issue a new 22-character code for an approved authorization request
    pub fn new(owner_id: Uuid, request: &PendingAuthorization) -> Self {
        Self {
            code: random::authorization_code(),
            client_id: request.client_id,
            owner_id,
            redirect_uri: request.redirect_uri.clone(),
            scope: request.scope.clone(),
            state: request.state.clone(),
            expires_at: Utc::now() + Duration::minutes(CODE_LIFETIME_MINUTES),
        }
    }

    /// Check an exchange request against the code's bindings
    ///
    /// Order matters: client binding, redirect URI echo, then expiry.
    pub fn validate_exchange(&self, request: &CodeExchangeRequest) -> Result<(), OAuthError> {
        if request.client_id != self.client_id {
            return Err(OAuthError::InvalidGrant(
                "authorization code was not issued to this client".to_string(),
            ));
        }
        if request.redirect_uri != self.redirect_uri {
            return Err(OAuthError::InvalidGrant(
                "redirect_uri does not match the authorization request".to_string(),
            ));
        }
        if Utc::now() >= self.expires_at {
            return Err(OAuthError::InvalidGrant(
                "authorization code has expired".to_string(),
            ));
        }
        Ok(())
    }
}
