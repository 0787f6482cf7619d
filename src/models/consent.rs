use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::grant::ResponseType;
use crate::utils::random;

/// A validated authorization request awaiting the owner's decision
///
/// Produced by request validation (client and redirect URI already verified,
/// scope already reduced) and held by the consent store until the owner
/// approves or the entry expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub response_type: ResponseType,
    pub client_id: Uuid,
    pub redirect_uri: String,
    pub scope: String,
    pub state: Option<String>,
}

/// One-shot token binding a pending authorization to an owner's approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentToken {
    pub client_id: Uuid,
    pub token: String,
}

impl ConsentToken {
    pub fn new(client_id: Uuid) -> Self {
        Self {
            client_id,
            token: random::token(),
        }
    }
}

/// Consent-store entry: the pending request plus its one-shot token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingConsent {
    pub request: PendingAuthorization,
    pub consent: ConsentToken,
    pub expires_at: DateTime<Utc>,
}
