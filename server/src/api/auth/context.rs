//! Organization-scoped authentication context
//!
//! The middleware resolves every request to exactly one organization and
//! stores an `AuthContext` in the request extensions. Handlers take the
//! [`Auth`] extractor and scope all reads and writes by [`AuthContext::org_id`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::api::types::ApiError;
use crate::core::constants::DEFAULT_ORG_ID;

/// Who is calling, reduced to the organization they act for
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// API key authentication
    ApiKey { key_id: String, org_id: String },
    /// Auth disabled and no key provided
    LocalDefault,
}

impl AuthContext {
    pub fn org_id(&self) -> &str {
        match self {
            Self::ApiKey { org_id, .. } => org_id,
            Self::LocalDefault => DEFAULT_ORG_ID,
        }
    }

    pub fn key_id(&self) -> Option<&str> {
        match self {
            Self::ApiKey { key_id, .. } => Some(key_id),
            Self::LocalDefault => None,
        }
    }
}

/// Rejection for the [`Auth`] extractor
pub enum AuthRejection {
    /// Auth context not available (middleware not applied)
    MissingContext,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingContext => ApiError::internal("Auth context not available").into_response(),
        }
    }
}

/// Authenticated caller, injected by `require_auth`
pub struct Auth {
    pub ctx: AuthContext,
}

impl Auth {
    pub fn org_id(&self) -> &str {
        self.ctx.org_id()
    }
}

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthRejection::MissingContext)?;
        Ok(Self { ctx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_id() {
        let ctx = AuthContext::ApiKey {
            key_id: "k1".into(),
            org_id: "acme".into(),
        };
        assert_eq!(ctx.org_id(), "acme");
        assert_eq!(ctx.key_id(), Some("k1"));
        assert_eq!(AuthContext::LocalDefault.org_id(), DEFAULT_ORG_ID);
        assert_eq!(AuthContext::LocalDefault.key_id(), None);
    }
}
