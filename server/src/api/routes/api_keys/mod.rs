//! API key endpoints
//!
//! Keys belong to the caller's organization:
//! - POST /api/v1/api-keys - Issue a key (plaintext returned once)
//! - GET /api/v1/api-keys - List key metadata
//! - DELETE /api/v1/api-keys/{id} - Revoke a key

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, Utc};

use crate::api::auth::Auth;
use crate::api::extractors::{IdPath, ValidatedJson};
use crate::api::types::ApiError;
use crate::core::ApiKeySecret;
use crate::data::{DataError, SqliteService, TransactionalRepository};
use crate::utils::api_key::{expiry_after_days, generate_api_key, hash_api_key, key_prefix};

use types::{ApiKeyDto, CreateApiKeyRequest, CreateApiKeyResponse};

/// Shared state for API key endpoints
#[derive(Clone)]
pub struct ApiKeysApiState {
    pub database: Arc<SqliteService>,
    pub api_key_secret: Arc<ApiKeySecret>,
}

/// Build API key routes
pub fn routes(database: Arc<SqliteService>, api_key_secret: Arc<ApiKeySecret>) -> Router<()> {
    let state = ApiKeysApiState {
        database,
        api_key_secret,
    };

    Router::new()
        .route("/", get(list_api_keys).post(create_api_key))
        .route("/{id}", delete(delete_api_key))
        .with_state(state)
}

/// Issue a new API key
///
/// The plaintext key is only returned in this response.
#[utoipa::path(
    post,
    path = "/api/v1/api-keys",
    tag = "api-keys",
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "Key issued", body = CreateApiKeyResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Key limit reached")
    )
)]
pub async fn create_api_key(
    State(state): State<ApiKeysApiState>,
    auth: Auth,
    ValidatedJson(req): ValidatedJson<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<CreateApiKeyResponse>), ApiError> {
    let key = generate_api_key();
    let expires_at = expiry_after_days(Utc::now().timestamp(), req.expires_in_days);

    let row = state
        .database
        .create_api_key(
            auth.org_id(),
            req.name.trim(),
            &hash_api_key(&key, state.api_key_secret.as_bytes()),
            &key_prefix(&key),
            expires_at,
        )
        .await
        .map_err(|e| match e {
            DataError::Conflict(message) if message.starts_with("Maximum") => {
                ApiError::conflict("KEY_LIMIT_REACHED", message)
            }
            e => ApiError::from_data(e),
        })?;

    tracing::info!(
        org_id = %row.organization_id,
        key_id = %row.id,
        key_prefix = %row.key_prefix,
        "API key issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateApiKeyResponse {
            id: row.id,
            name: row.name,
            key,
            key_prefix: row.key_prefix,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_else(Utc::now),
            expires_at: row
                .expires_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }),
    ))
}

/// List the organization's API keys (metadata only)
#[utoipa::path(
    get,
    path = "/api/v1/api-keys",
    tag = "api-keys",
    responses(
        (status = 200, description = "Keys, newest first", body = Vec<ApiKeyDto>)
    )
)]
pub async fn list_api_keys(
    State(state): State<ApiKeysApiState>,
    auth: Auth,
) -> Result<Json<Vec<ApiKeyDto>>, ApiError> {
    let keys = state
        .database
        .list_api_keys(auth.org_id())
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(keys.into_iter().map(ApiKeyDto::from).collect()))
}

/// Revoke an API key
#[utoipa::path(
    delete,
    path = "/api/v1/api-keys/{id}",
    tag = "api-keys",
    params(
        ("id" = String, Path, description = "API key ID")
    ),
    responses(
        (status = 204, description = "Key revoked"),
        (status = 404, description = "Key not found")
    )
)]
pub async fn delete_api_key(
    State(state): State<ApiKeysApiState>,
    auth: Auth,
    path: IdPath,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .database
        .delete_api_key(auth.org_id(), &path.id)
        .await
        .map_err(ApiError::from_data)?;

    if !deleted {
        return Err(ApiError::not_found(
            "KEY_NOT_FOUND",
            format!("API key not found: {}", path.id),
        ));
    }

    tracing::info!(org_id = %auth.org_id(), key_id = %path.id, "API key revoked");
    Ok(StatusCode::NO_CONTENT)
}
