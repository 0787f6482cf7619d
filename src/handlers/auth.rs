//! Caller authentication for the HTTP surface
//!
//! Owners authenticate with HTTP Basic against the owner registry; clients
//! authenticate with Basic or form parameters depending on their registered
//! token endpoint auth method.

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::OAuthError;
use crate::models::{ClientCtx, Owner, OwnerCtx, TokenEndpointAuthMethod};

/// Decode the Basic Authorization header into (user, password)
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Authenticate the resource owner carried in the Basic header
pub async fn authenticate_owner(
    engine: &Engine,
    headers: &HeaderMap,
) -> Result<OwnerCtx, OAuthError> {
    let (username, password) =
        basic_credentials(headers).ok_or(OAuthError::AccessDenied)?;
    engine
        .owners
        .validate(&username, &password)
        .await
        .ok_or(OAuthError::AccessDenied)
}

/// Authenticate the owner and load the full aggregate for group checks
pub async fn authenticate_owner_full(
    engine: &Engine,
    headers: &HeaderMap,
) -> Result<Owner, OAuthError> {
    let ctx = authenticate_owner(engine, headers).await?;
    engine
        .owners
        .get_by_id(ctx.owner_id)
        .await
        .ok_or(OAuthError::AccessDenied)
}

/// Authenticate a client via Basic, form credentials, or `none`
///
/// Public clients (auth method `none`) identify themselves by `client_id`
/// alone; everything else needs a live secret over one of the two channels.
pub async fn authenticate_client(
    engine: &Engine,
    headers: &HeaderMap,
    form_client_id: Option<&str>,
    form_client_secret: Option<&str>,
) -> Result<ClientCtx, OAuthError> {
    if let Some((id, secret)) = basic_credentials(headers) {
        let client_id = Uuid::parse_str(&id).map_err(|_| OAuthError::InvalidClient)?;
        let client = engine
            .clients
            .authenticate(client_id, &secret)
            .await
            .ok_or(OAuthError::InvalidClient)?;
        return Ok(client.ctx());
    }

    let client_id = form_client_id
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(OAuthError::InvalidClient)?;

    if let Some(secret) = form_client_secret {
        let client = engine
            .clients
            .authenticate(client_id, secret)
            .await
            .ok_or(OAuthError::InvalidClient)?;
        return Ok(client.ctx());
    }

    // no secret presented: acceptable only for public clients
    let client = engine
        .clients
        .get(client_id)
        .await
        .ok_or(OAuthError::InvalidClient)?;
    if client.token_endpoint_auth_method != TokenEndpointAuthMethod::None {
        return Err(OAuthError::InvalidClient);
    }
    Ok(client.ctx())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    fn basic_header(user: &str, password: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let encoded = STANDARD.encode(format!("{}:{}", user, password));
        headers.insert(
            AUTHORIZATION,
            format!("Basic {}", encoded).parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_basic_credentials_round_trip() {
        let headers = basic_header("alice", "pw:with:colons");
        let (user, password) = basic_credentials(&headers).unwrap();
        assert_eq!(user, "alice");
        assert_eq!(password, "pw:with:colons");
    }

    #[test]
    fn test_basic_credentials_missing_header() {
        assert!(basic_credentials(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn test_authenticate_client_by_basic() {
        let engine = crate::engine::test_engine();
        let client = engine
            .clients
            .register(
                &crate::dto::oauth::ClientRegistrationRequest {
                    redirect_uris: vec!["https://app/cb".to_string()],
                    grant_types: vec!["client_credentials".to_string()],
                    response_types: vec!["token".to_string()],
                    ..Default::default()
                },
                chrono::Duration::hours(1),
                None,
            )
            .await
            .unwrap();

        let headers = basic_header(&client.id.to_string(), &client.secret);
        let ctx = authenticate_client(&engine, &headers, None, None)
            .await
            .unwrap();
        assert_eq!(ctx.client_id, client.id);

        let bad = basic_header(&client.id.to_string(), "wrong");
        assert!(authenticate_client(&engine, &bad, None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_authenticate_public_client_without_secret() {
        let engine = crate::engine::test_engine();
        let client = engine
            .clients
            .register(
                &crate::dto::oauth::ClientRegistrationRequest {
                    redirect_uris: vec!["https://app/cb".to_string()],
                    token_endpoint_auth_method: Some("none".to_string()),
                    grant_types: vec!["implicit".to_string()],
                    response_types: vec!["token".to_string()],
                    ..Default::default()
                },
                chrono::Duration::hours(1),
                None,
            )
            .await
            .unwrap();

        let id = client.id.to_string();
        let ctx = authenticate_client(&engine, &HeaderMap::new(), Some(&id), None)
            .await
            .unwrap();
        assert_eq!(ctx.client_id, client.id);
    }

    #[tokio::test]
    async fn test_confidential_client_requires_secret() {
        let engine = crate::engine::test_engine();
        let client = engine
            .clients
            .register(
                &crate::dto::oauth::ClientRegistrationRequest {
                    redirect_uris: vec!["https://app/cb".to_string()],
                    grant_types: vec!["client_credentials".to_string()],
                    response_types: vec!["token".to_string()],
                    ..Default::default()
                },
                chrono::Duration::hours(1),
                None,
            )
            .await
            .unwrap();

        let id = client.id.to_string();
        let err = authenticate_client(&engine, &HeaderMap::new(), Some(&id), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::InvalidClient));
    }
}
