use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::oauth::ClientRegistrationRequest;
use crate::error::OAuthError;
use crate::models::{Client, GrantType, ResponseType, TokenEndpointAuthMethod};
use crate::utils::random;

/// Registry of OAuth2 clients
///
/// The authority on client metadata, secret validation and capability
/// queries. Clients never auto-expire; only their secret does.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<Uuid, Client>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client from validated metadata
    ///
    /// Generates the client id and a password-grade secret; the secret
    /// expires after `secret_duration`.
    pub async fn register(
        &self,
        request: &ClientRegistrationRequest,
        secret_duration: Duration,
        owner_id: Option<Uuid>,
    ) -> Result<Client, OAuthError> {
        let client = build_client(request, secret_duration, owner_id)?;
        tracing::info!(client_id = %client.id, name = %client.name, "client registered");
        self.clients.write().await.insert(client.id, client.clone());
        Ok(client)
    }

    pub async fn get(&self, client_id: Uuid) -> Option<Client> {
        self.clients.read().await.get(&client_id).cloned()
    }

    /// Replace a client's metadata, keeping its identity and secret
    pub async fn replace(
        &self,
        client_id: Uuid,
        request: &ClientRegistrationRequest,
    ) -> Result<Client, OAuthError> {
        let mut clients = self.clients.write().await;
        let existing = clients
            .get(&client_id)
            .ok_or(OAuthError::InvalidClientIdentifier)?;

        let mut updated = build_client(request, Duration::zero(), existing.owner_id)?;
        updated.id = existing.id;
        updated.secret = existing.secret.clone();
        updated.id_issued_at = existing.id_issued_at;
        updated.secret_expires_at = existing.secret_expires_at;

        clients.insert(client_id, updated.clone());
        Ok(updated)
    }

    pub async fn delete(&self, client_id: Uuid) -> bool {
        self.clients.write().await.remove(&client_id).is_some()
    }

    pub async fn list(&self) -> Vec<Client> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Authenticate a client by id and secret
    ///
    /// Returns the client iff the secret matches under constant-time
    /// comparison and has not expired.
    pub async fn authenticate(&self, client_id: Uuid, secret: &str) -> Option<Client> {
        let clients = self.clients.read().await;
        let client = clients.get(&client_id)?;
        if client.validate_secret(secret, Utc::now()) {
            Some(client.clone())
        } else {
            tracing::debug!(client_id = %client_id, "client secret rejected");
            None
        }
    }
}

/// Validate registration metadata and construct the client aggregate
fn build_client(
    request: &ClientRegistrationRequest,
    secret_duration: Duration,
    owner_id: Option<Uuid>,
) -> Result<Client, OAuthError> {
    if request.redirect_uris.is_empty() {
        return Err(OAuthError::InvalidClientMetadata(
            "redirect_uris must not be empty".to_string(),
        ));
    }
    for uri in &request.redirect_uris {
        if !is_absolute_uri(uri) {
            return Err(OAuthError::InvalidClientMetadata(format!(
                "redirect URI is not absolute: {}",
                uri
            )));
        }
    }
    if request.jwks.is_some() && request.jwks_uri.is_some() {
        return Err(OAuthError::InvalidClientMetadata(
            "jwks and jwks_uri must not both be present".to_string(),
        ));
    }

    let mut grant_types: HashSet<GrantType> = HashSet::new();
    for s in &request.grant_types {
        let gt = GrantType::parse(s).ok_or_else(|| {
            OAuthError::InvalidClientMetadata(format!("unknown grant type: {}", s))
        })?;
        grant_types.insert(gt);
    }
    if grant_types.is_empty() {
        grant_types.insert(GrantType::AuthorizationCode);
    }

    let mut response_types: HashSet<ResponseType> = HashSet::new();
    for s in &request.response_types {
        let rt = ResponseType::parse(s).ok_or_else(|| {
            OAuthError::InvalidClientMetadata(format!("unknown response type: {}", s))
        })?;
        response_types.insert(rt);
    }
    if response_types.is_empty() {
        response_types.insert(ResponseType::Code);
    }

    // grant/response consistency per RFC 7591 §2
    if grant_types.contains(&GrantType::AuthorizationCode)
        && !response_types.contains(&ResponseType::Code)
    {
        return Err(OAuthError::InvalidClientMetadata(
            "authorization_code grant requires the code response type".to_string(),
        ));
    }
    if grant_types.contains(&GrantType::Implicit) && !response_types.contains(&ResponseType::Token)
    {
        return Err(OAuthError::InvalidClientMetadata(
            "implicit grant requires the token response type".to_string(),
        ));
    }

    let token_endpoint_auth_method = match &request.token_endpoint_auth_method {
        Some(s) => TokenEndpointAuthMethod::parse(s).ok_or_else(|| {
            OAuthError::InvalidClientMetadata(format!(
                "unknown token endpoint auth method: {}",
                s
            ))
        })?,
        None => TokenEndpointAuthMethod::default(),
    };

    let now = Utc::now();
    Ok(Client {
        id: Uuid::new_v4(),
        name: request.client_name.clone().unwrap_or_default(),
        redirect_uris: request.redirect_uris.iter().cloned().collect(),
        grant_types,
        response_types,
        scope: request
            .scope
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string(),
        secret: random::client_secret(),
        id_issued_at: now,
        secret_expires_at: now + secret_duration,
        token_endpoint_auth_method,
        owner_id,
        contacts: request.contacts.clone(),
        client_uri: request.client_uri.clone(),
        logo_uri: request.logo_uri.clone(),
        policy_uri: request.policy_uri.clone(),
        tos_uri: request.tos_uri.clone(),
        jwks_uri: request.jwks_uri.clone(),
        jwks: request.jwks.clone(),
        software_id: request.software_id.clone(),
        software_version: request.software_version.clone(),
    })
}

/// Redirect URIs must be absolute: a scheme followed by a non-empty remainder
fn is_absolute_uri(uri: &str) -> bool {
    match uri.split_once("://") {
        Some((scheme, rest)) => {
            !scheme.is_empty()
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
                && !rest.is_empty()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> ClientRegistrationRequest {
        ClientRegistrationRequest {
            redirect_uris: vec!["https://app/cb".to_string()],
            token_endpoint_auth_method: Some("client_secret_basic".to_string()),
            grant_types: vec!["authorization_code".to_string(), "refresh_token".to_string()],
            response_types: vec!["code".to_string()],
            client_name: Some("test app".to_string()),
            client_uri: None,
            logo_uri: None,
            scope: Some("read write".to_string()),
            contacts: Vec::new(),
            tos_uri: None,
            policy_uri: None,
            jwks_uri: None,
            jwks: None,
            software_id: None,
            software_version: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = ClientRegistry::new();
        let client = registry
            .register(&registration(), Duration::hours(1), None)
            .await
            .unwrap();

        assert_eq!(client.secret.len(), random::CLIENT_SECRET_LENGTH);
        let fetched = registry.get(client.id).await.unwrap();
        assert_eq!(fetched.name, "test app");
        assert_eq!(fetched.scope, "read write");
    }

    #[tokio::test]
    async fn test_register_rejects_relative_redirect_uri() {
        let registry = ClientRegistry::new();
        let mut request = registration();
        request.redirect_uris = vec!["/cb".to_string()];

        let err = registry
            .register(&request, Duration::hours(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::InvalidClientMetadata(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_inconsistent_grants() {
        let registry = ClientRegistry::new();
        let mut request = registration();
        request.grant_types = vec!["implicit".to_string()];
        request.response_types = vec!["code".to_string()];

        let err = registry
            .register(&request, Duration::hours(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::InvalidClientMetadata(_)));
    }

    #[tokio::test]
    async fn test_authenticate_constant_time_and_expiry() {
        let registry = ClientRegistry::new();
        let client = registry
            .register(&registration(), Duration::hours(1), None)
            .await
            .unwrap();

        assert!(registry.authenticate(client.id, &client.secret).await.is_some());
        assert!(registry.authenticate(client.id, "wrong").await.is_none());

        let expired = registry
            .register(&registration(), Duration::seconds(-1), None)
            .await
            .unwrap();
        assert!(registry.authenticate(expired.id, &expired.secret).await.is_none());
    }

    #[tokio::test]
    async fn test_replace_keeps_identity_and_secret() {
        let registry = ClientRegistry::new();
        let client = registry
            .register(&registration(), Duration::hours(1), None)
            .await
            .unwrap();

        let mut request = registration();
        request.client_name = Some("renamed".to_string());
        let updated = registry.replace(client.id, &request).await.unwrap();

        assert_eq!(updated.id, client.id);
        assert_eq!(updated.secret, client.secret);
        assert_eq!(updated.name, "renamed");
    }

    #[tokio::test]
    async fn test_delete() {
        let registry = ClientRegistry::new();
        let client = registry
            .register(&registration(), Duration::hours(1), None)
            .await
            .unwrap();

        assert!(registry.delete(client.id).await);
        assert!(!registry.delete(client.id).await);
        assert!(registry.get(client.id).await.is_none());
    }
}
