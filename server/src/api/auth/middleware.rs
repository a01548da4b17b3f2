//! Authentication middleware

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::context::AuthContext;
use crate::core::ApiKeySecret;
use crate::core::constants::API_KEY_TOUCH_DEBOUNCE_SECS;
use crate::data::types::ApiKeyValidation;
use crate::data::{SqliteService, TransactionalRepository};
use crate::utils::api_key::{extract_bearer_key, hash_api_key, is_valid_api_key};

/// Authentication error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub error: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    pub fn required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "AUTH_REQUIRED",
            message: "Authentication required".to_string(),
        }
    }

    pub fn invalid_api_key() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "API_KEY_INVALID",
            message: "Invalid API key".to_string(),
        }
    }

    pub fn expired_api_key() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "API_KEY_EXPIRED",
            message: "API key has expired".to_string(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: "service_unavailable",
            code: "AUTH_UNAVAILABLE",
            message: "Unable to verify credentials".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    /// Database service for API key validation
    pub database: Arc<SqliteService>,
    /// API key HMAC secret
    pub api_key_secret: Arc<ApiKeySecret>,
    /// When false, requests without a key run as the default organization
    pub auth_enabled: bool,
}

/// Authentication middleware
///
/// A bearer API key always takes precedence; without one the request either
/// runs as the default organization (auth disabled) or is rejected.
///
/// Injects `AuthContext` into request extensions.
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_key);

    if let Some(key) = bearer {
        if !is_valid_api_key(&key) {
            return Err(AuthError::invalid_api_key());
        }

        let key_hash = hash_api_key(&key, state.api_key_secret.as_bytes());
        let validation = state
            .database
            .get_api_key_by_hash(&key_hash)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "API key lookup failed");
                AuthError::unavailable()
            })?
            .ok_or_else(AuthError::invalid_api_key)?;

        if validation.is_expired(chrono::Utc::now().timestamp()) {
            tracing::debug!(key_id = %validation.key_id, "Rejected expired API key");
            return Err(AuthError::expired_api_key());
        }

        touch_if_needed(state.database.clone(), &validation);

        request.extensions_mut().insert(AuthContext::ApiKey {
            key_id: validation.key_id,
            org_id: validation.organization_id,
        });
        return Ok(next.run(request).await);
    }

    if !state.auth_enabled {
        request.extensions_mut().insert(AuthContext::LocalDefault);
        return Ok(next.run(request).await);
    }

    Err(AuthError::required())
}

fn needs_touch(last_used_at: Option<i64>, now: i64) -> bool {
    last_used_at
        .map(|t| now - t > API_KEY_TOUCH_DEBOUNCE_SECS)
        .unwrap_or(true)
}

/// Update last_used_at if not recently touched (debounced)
fn touch_if_needed(database: Arc<SqliteService>, v: &ApiKeyValidation) {
    if !needs_touch(v.last_used_at, chrono::Utc::now().timestamp()) {
        return;
    }

    let key_id = v.key_id.clone();
    tokio::spawn(async move {
        if let Err(e) = database.touch_api_key(&key_id).await {
            tracing::warn!(key_id = %key_id, error = %e, "Failed to update API key last_used_at");
        }
    });
}
