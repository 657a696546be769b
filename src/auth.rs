// Gateway authentication: a shared bearer token, compared by sha256 digest.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use sha2::{Digest, Sha256};

/// Hex sha256 digest of a raw token. Only digests are kept in memory.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Gateway auth settings, injected as a request extension at router build
/// time. A `None` digest means no token is configured and the API runs
/// open (local development).
#[derive(Debug, Clone, Default)]
pub struct GatewayAuthConfig {
    pub token_digest: Option<String>,
}

impl GatewayAuthConfig {
    pub fn from_token(token: Option<&str>) -> Self {
        Self {
            token_digest: token.map(token_digest),
        }
    }
}

/// Extracts successfully only when the request carries the gateway bearer
/// token (or when no token is configured).
/// Usage: add `GatewayAuth` to handler parameters.
#[derive(Debug, Clone, Copy)]
pub struct GatewayAuth;

impl<S> FromRequestParts<S> for GatewayAuth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let expected = parts
            .extensions
            .get::<Arc<GatewayAuthConfig>>()
            .and_then(|c| c.token_digest.clone());

        // Open mode: nothing configured, nothing to check.
        let Some(expected) = expected else {
            return Ok(GatewayAuth);
        };

        let header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

        if token_digest(token) != expected {
            return Err(unauthorized("Invalid token"));
        }

        Ok(GatewayAuth)
    }
}

fn unauthorized(msg: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": msg})),
    )
}
