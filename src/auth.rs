//! Static API token authentication.
//!
//! Callers present a token either as `Authorization: Bearer <token>` or in
//! an `x-api-key` header. Each configured token maps to a user name and a
//! [`Role`]; a request is then admitted when that role reaches the floor of
//! the operation it calls.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::role::Role;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub name: String,
    pub role: Role,
}

/// One configured credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub user: String,
    pub token: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("role {actual} is below required role {required}")]
    Forbidden { required: Role, actual: Role },
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Token table built from configuration.
#[derive(Debug, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, Caller>,
}

impl TokenAuthenticator {
    pub fn new(entries: &[TokenEntry]) -> Self {
        let tokens = entries
            .iter()
            .map(|e| {
                (
                    e.token.clone(),
                    Caller {
                        name: e.user.clone(),
                        role: e.role,
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Extracts the presented token, preferring the Authorization header.
    fn presented_token(headers: &HeaderMap) -> Option<&str> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        bearer.or_else(|| {
            headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|t| !t.is_empty())
        })
    }

    /// Resolves the caller, if any token matches.
    pub fn identify(&self, headers: &HeaderMap) -> Option<Caller> {
        let token = Self::presented_token(headers)?;
        self.tokens.get(token).cloned()
    }

    /// Admits the request only when the caller's role reaches `floor`.
    pub fn authorize(&self, headers: &HeaderMap, floor: Role) -> Result<Caller, AuthError> {
        let caller = self.identify(headers).ok_or(AuthError::Unauthenticated)?;
        if caller.role.allows(floor) {
            Ok(caller)
        } else {
            debug!(
                "Rejected {} ({}) for operation requiring {}",
                caller.name, caller.role, floor
            );
            Err(AuthError::Forbidden {
                required: floor,
                actual: caller.role,
            })
        }
    }
}

/// State for [`require_role`]: the token table and the route's floor.
#[derive(Debug, Clone)]
pub struct RoleGate {
    pub authenticator: Arc<TokenAuthenticator>,
    pub floor: Role,
}

/// Middleware that rejects requests whose caller is below the gate's floor.
pub async fn require_role(State(gate): State<RoleGate>, req: Request, next: Next) -> Response {
    match gate.authenticator.authorize(req.headers(), gate.floor) {
        Ok(_) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn authenticator() -> TokenAuthenticator {
        TokenAuthenticator::new(&[
            TokenEntry {
                user: "alice".into(),
                token: "admin-token".into(),
                role: Role::Admin,
            },
            TokenEntry {
                user: "bob".into(),
                token: "viewer-token".into(),
                role: Role::Viewer,
            },
        ])
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_missing_token_is_unauthenticated() {
        let auth = authenticator();
        assert_eq!(
            auth.authorize(&HeaderMap::new(), Role::Viewer),
            Err(AuthError::Unauthenticated)
        );
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unknown_token_is_unauthenticated() {
        let auth = authenticator();
        assert_eq!(
            auth.authorize(&bearer("nope"), Role::Viewer),
            Err(AuthError::Unauthenticated)
        );
    }

    #[test]
    fn test_insufficient_role_is_forbidden() {
        let auth = authenticator();
        let err = auth.authorize(&bearer("viewer-token"), Role::Admin).unwrap_err();
        assert_eq!(
            err,
            AuthError::Forbidden {
                required: Role::Admin,
                actual: Role::Viewer
            }
        );
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_api_key_header() {
        let auth = authenticator();
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("admin-token"));

        let caller = auth.authorize(&headers, Role::Admin).unwrap();
        assert_eq!(caller.name, "alice");
        assert_eq!(caller.role, Role::Admin);
    }

    #[test]
    fn test_higher_role_passes_lower_floor() {
        let auth = authenticator();
        assert!(auth.authorize(&bearer("admin-token"), Role::Viewer).is_ok());
        assert!(auth.authorize(&bearer("viewer-token"), Role::Viewer).is_ok());
    }

    #[test]
    fn test_empty_bearer_falls_back_to_api_key() {
        let auth = authenticator();
        let mut headers = bearer("");
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("viewer-token"));
        let caller = auth.identify(&headers).unwrap();
        assert_eq!(caller.name, "bob");
    }
}
