//! Owner management DTOs

use serde::{Deserialize, Serialize};

use crate::models::Owner;

/// Body of POST /owners
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOwnerRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub groups: Vec<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
}

/// Body of PUT /owners/{id}: the replaceable attribute bag
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceOwnerRequest {
    pub display_name: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Owner view returned by the management endpoints; never the credential
#[derive(Debug, Clone, Serialize)]
pub struct OwnerResponse {
    pub id: String,
    pub username: String,
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Owner> for OwnerResponse {
    fn from(owner: &Owner) -> Self {
        Self {
            id: owner.id.to_string(),
            username: owner.username.clone(),
            groups: owner.groups.clone(),
            display_name: owner.attributes.display_name.clone(),
            emails: owner.attributes.emails.clone(),
            active: owner.attributes.active,
            created_at: owner.created_at,
        }
    }
}
