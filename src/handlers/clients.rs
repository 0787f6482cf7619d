//! Dynamic client registration and management (RFC 7591 surface)

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::dto::oauth::{ClientInformationResponse, ClientRegistrationRequest};
use crate::error::OAuthError;
use crate::handlers::auth::authenticate_owner_full;
use crate::models::{Client, Owner};

/// Mutation rights: the registering owner or any member of the admins group
fn may_manage(owner: &Owner, client: &Client) -> bool {
    owner.is_admin() || client.owner_id == Some(owner.id)
}

/// POST /oauth/clients
pub async fn register_client_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ClientRegistrationRequest>,
) -> Result<(StatusCode, Json<ClientInformationResponse>), OAuthError> {
    let owner = authenticate_owner_full(&state.engine, &headers).await?;

    let client = state
        .engine
        .clients
        .register(
            &request,
            state.engine.policy.client_secret_duration,
            Some(owner.id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ClientInformationResponse::from(&client))))
}

/// GET /oauth/clients
pub async fn list_clients_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ClientInformationResponse>>, OAuthError> {
    let owner = authenticate_owner_full(&state.engine, &headers).await?;
    if !owner.is_admin() {
        return Err(OAuthError::AccessDenied);
    }

    let clients = state.engine.clients.list().await;
    Ok(Json(
        clients.iter().map(ClientInformationResponse::from).collect(),
    ))
}

/// GET /oauth/clients/{id}
pub async fn get_client_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ClientInformationResponse>, OAuthError> {
    let owner = authenticate_owner_full(&state.engine, &headers).await?;
    let client = state
        .engine
        .clients
        .get(client_id)
        .await
        .ok_or(OAuthError::InvalidClientIdentifier)?;
    if !may_manage(&owner, &client) {
        return Err(OAuthError::AccessDenied);
    }
    Ok(Json(ClientInformationResponse::from(&client)))
}

/// PUT /oauth/clients/{id}
pub async fn replace_client_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(client_id): Path<Uuid>,
    Json(request): Json<ClientRegistrationRequest>,
) -> Result<Json<ClientInformationResponse>, OAuthError> {
    let owner = authenticate_owner_full(&state.engine, &headers).await?;
    let client = state
        .engine
        .clients
        .get(client_id)
        .await
        .ok_or(OAuthError::InvalidClientIdentifier)?;
    if !may_manage(&owner, &client) {
        return Err(OAuthError::AccessDenied);
    }

    let updated = state.engine.clients.replace(client_id, &request).await?;
    Ok(Json(ClientInformationResponse::from(&updated)))
}

/// DELETE /oauth/clients/{id}
pub async fn delete_client_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(client_id): Path<Uuid>,
) -> Result<StatusCode, OAuthError> {
    let owner = authenticate_owner_full(&state.engine, &headers).await?;
    let client = state
        .engine
        .clients
        .get(client_id)
        .await
        .ok_or(OAuthError::InvalidClientIdentifier)?;
    if !may_manage(&owner, &client) {
        return Err(OAuthError::AccessDenied);
    }

    state.engine.clients.delete(client_id).await;
    Ok(StatusCode::NO_CONTENT)
}
