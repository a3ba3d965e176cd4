//! Bearer token authentication
//!
//! Provides:
//! - HS256 JWT generation and validation
//! - Bearer header parsing
//! - Middleware guarding the `/v1` routes when a secret is configured

use crate::errors::{AppError, Result};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
#[cfg(any(test, feature = "test-util"))]
use {
    chrono::{Duration, Utc},
    jsonwebtoken::{encode, EncodingKey, Header},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (calling user or service)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    #[cfg(any(test, feature = "test-util"))]
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str) -> Self {
        Self {
            #[cfg(any(test, feature = "test-util"))]
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `subject` valid for `ttl`. Tokens are minted by the
    /// identity provider in deployment; this is for tests only.
    #[cfg(any(test, feature = "test-util"))]
    pub fn generate_token(&self, subject: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: subject.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid bearer token".to_string(),
                },
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Reject requests without a valid bearer token; claims are stored as a
/// request extension for handlers that want the caller's subject.
pub async fn require_bearer(
    State(jwt): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing bearer token".to_string(),
        })?;

    let claims = jwt.validate_token(token)?;
    tracing::debug!(subject = %claims.sub, "Bearer token accepted");
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("abc.def"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret");
        let token = manager.generate_token("registry-admin", Duration::hours(1)).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "registry-admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token() {
        let manager = JwtManager::new("test_secret");
        let token = manager.generate_token("svc", Duration::hours(-2)).unwrap();

        assert!(matches!(manager.validate_token(&token), Err(AppError::ExpiredToken)));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = JwtManager::new("one").generate_token("svc", Duration::hours(1)).unwrap();
        let err = JwtManager::new("two").validate_token(&token).unwrap_err();

        assert!(matches!(err, AppError::Unauthorized { .. }));
    }
}
