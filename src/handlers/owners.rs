//! Owner management endpoints

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::dto::owner::{CreateOwnerRequest, OwnerResponse, ReplaceOwnerRequest};
use crate::error::OAuthError;
use crate::handlers::auth::authenticate_owner_full;
use crate::models::OwnerAttributes;

/// POST /owners (admin only)
pub async fn create_owner_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateOwnerRequest>,
) -> Result<(StatusCode, Json<OwnerResponse>), OAuthError> {
    let caller = authenticate_owner_full(&state.engine, &headers).await?;
    if !caller.is_admin() {
        return Err(OAuthError::AccessDenied);
    }

    let owner = state
        .engine
        .owners
        .create(
            &request.username,
            &request.password,
            request.groups,
            OwnerAttributes {
                display_name: request.display_name,
                emails: request.emails,
                active: true,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(OwnerResponse::from(&owner))))
}

/// GET /owners (admin only)
pub async fn list_owners_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<OwnerResponse>>, OAuthError> {
    let caller = authenticate_owner_full(&state.engine, &headers).await?;
    if !caller.is_admin() {
        return Err(OAuthError::AccessDenied);
    }

    let owners = state.engine.owners.list().await;
    Ok(Json(owners.iter().map(OwnerResponse::from).collect()))
}

/// GET /owners/{id} (admin or self)
pub async fn get_owner_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<OwnerResponse>, OAuthError> {
    let caller = authenticate_owner_full(&state.engine, &headers).await?;
    if !caller.is_admin() && caller.id != owner_id {
        return Err(OAuthError::AccessDenied);
    }

    let owner = state
        .engine
        .owners
        .get_by_id(owner_id)
        .await
        .ok_or_else(|| OAuthError::InvalidRequest("owner not found".to_string()))?;
    Ok(Json(OwnerResponse::from(&owner)))
}

/// PUT /owners/{id} (admin or self)
pub async fn replace_owner_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner_id): Path<Uuid>,
    Json(request): Json<ReplaceOwnerRequest>,
) -> Result<Json<OwnerResponse>, OAuthError> {
    let caller = authenticate_owner_full(&state.engine, &headers).await?;
    if !caller.is_admin() && caller.id != owner_id {
        return Err(OAuthError::AccessDenied);
    }

    let owner = state
        .engine
        .owners
        .replace(
            owner_id,
            OwnerAttributes {
                display_name: request.display_name,
                emails: request.emails,
                active: request.active,
            },
        )
        .await?;
    Ok(Json(OwnerResponse::from(&owner)))
}

/// DELETE /owners/{id} (admin only)
pub async fn delete_owner_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner_id): Path<Uuid>,
) -> Result<StatusCode, OAuthError> {
    let caller = authenticate_owner_full(&state.engine, &headers).await?;
    if !caller.is_admin() {
        return Err(OAuthError::AccessDenied);
    }

    state.engine.owners.delete(owner_id).await;
    Ok(StatusCode::NO_CONTENT)
}
