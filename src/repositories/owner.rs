use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::OAuthError;
use crate::models::{Owner, OwnerAttributes, OwnerCtx, ADMIN_GROUP};
use crate::utils::password::{hash_password, verify_password};

/// Registry of resource owners
///
/// Usernames are case-folded to lowercase before storage and lookup.
#[derive(Clone, Default)]
pub struct OwnerRegistry {
    owners: Arc<RwLock<HashMap<Uuid, Owner>>>,
    by_username: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl OwnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new owner with a hashed credential
    pub async fn create(
        &self,
        username: &str,
        secret: &str,
        groups: Vec<String>,
        attributes: OwnerAttributes,
    ) -> Result<Owner, OAuthError> {
        let username = username.to_lowercase();
        let mut by_username = self.by_username.write().await;
        if by_username.contains_key(&username) {
            return Err(OAuthError::InvalidRequest(format!(
                "username already exists: {}",
                username
            )));
        }

        let owner = Owner {
            id: Uuid::new_v4(),
            username: username.clone(),
            password_hash: hash_password(secret)?,
            groups,
            attributes,
            created_at: Utc::now(),
        };

        by_username.insert(username, owner.id);
        self.owners.write().await.insert(owner.id, owner.clone());
        tracing::info!(owner_id = %owner.id, username = %owner.username, "owner created");
        Ok(owner)
    }

    pub async fn get_by_id(&self, owner_id: Uuid) -> Option<Owner> {
        self.owners.read().await.get(&owner_id).cloned()
    }

    pub async fn get_by_username(&self, username: &str) -> Option<Owner> {
        let id = *self.by_username.read().await.get(&username.to_lowercase())?;
        self.owners.read().await.get(&id).cloned()
    }

    /// Validate a credential; returns the owner context on success
    pub async fn validate(&self, username: &str, secret: &str) -> Option<OwnerCtx> {
        let owner = self.get_by_username(username).await?;
        match verify_password(secret, &owner.password_hash) {
            Ok(true) => Some(owner.ctx()),
            Ok(false) => {
                tracing::debug!(username = %owner.username, "owner credential rejected");
                None
            }
            Err(e) => {
                tracing::error!(username = %owner.username, error = %e, "credential verification failed");
                None
            }
        }
    }

    /// Replace an owner's attribute bag
    pub async fn replace(
        &self,
        owner_id: Uuid,
        attributes: OwnerAttributes,
    ) -> Result<Owner, OAuthError> {
        let mut owners = self.owners.write().await;
        let owner = owners
            .get_mut(&owner_id)
            .ok_or_else(|| OAuthError::InvalidRequest("owner not found".to_string()))?;
        owner.attributes = attributes;
        Ok(owner.clone())
    }

    pub async fn delete(&self, owner_id: Uuid) -> bool {
        let removed = self.owners.write().await.remove(&owner_id);
        match removed {
            Some(owner) => {
                self.by_username.write().await.remove(&owner.username);
                true
            }
            None => false,
        }
    }

    pub async fn list(&self) -> Vec<Owner> {
        self.owners.read().await.values().cloned().collect()
    }

    /// Create the initial administrator when the admin group is empty
    pub async fn bootstrap_admin(&self, username: &str, secret: &str) -> Result<(), OAuthError> {
        let has_admin = self
            .owners
            .read()
            .await
            .values()
            .any(|owner| owner.is_admin());
        if has_admin {
            return Ok(());
        }

        self.create(
            username,
            secret,
            vec![ADMIN_GROUP.to_string()],
            OwnerAttributes {
                display_name: Some("Administrator".to_string()),
                emails: Vec::new(),
                active: true,
            },
        )
        .await?;
        tracing::info!(username = %username.to_lowercase(), "administrator bootstrapped");
        Ok(())
    }
}
