use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Administrative group granting full access to registries and introspection
pub const ADMIN_GROUP: &str = "admins";

/// Profile attributes carried on an owner; opaque to the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerAttributes {
    pub display_name: Option<String>,
    pub emails: Vec<String>,
    pub active: bool,
}

/// A resource owner (end user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    /// Case-folded to lowercase; unique within the registry
    pub username: String,
    /// Argon2id PHC string, never the credential itself
    pub password_hash: String,
    pub groups: Vec<String>,
    pub attributes: OwnerAttributes,
    pub created_at: DateTime<Utc>,
}

/// The authenticated-owner view handed to services
#[derive(Debug, Clone)]
pub struct OwnerCtx {
    pub owner_id: Uuid,
    pub username: String,
}

impl Owner {
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    pub fn is_admin(&self) -> bool {
        self.in_group(ADMIN_GROUP)
    }

    pub fn ctx(&self) -> OwnerCtx {
        OwnerCtx {
            owner_id: self.id,
            username: self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_membership() {
        let owner = Owner {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: String::new(),
            groups: vec![ADMIN_GROUP.to_string()],
            attributes: OwnerAttributes::default(),
            created_at: Utc::now(),
        };
        assert!(owner.is_admin());
        assert!(!owner.in_group("clients"));
    }
}
