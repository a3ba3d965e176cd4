//! Request extractors that reject with the service's error body

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use drugreg_common::{codec, errors::AppError};
use serde::de::DeserializeOwned;

/// JSON body decoded with [`codec::decode_strict`]: unknown keys, wrong
/// types and trailing data are `INVALID_JSON`.
pub struct StrictJson<T>(pub T);

impl<T, S> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::MalformedInput {
                message: e.body_text(),
            })?;

        codec::decode_strict(&bytes).map(StrictJson)
    }
}

/// Numeric `{id}` path segment
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::InvalidFormat {
                message: e.body_text(),
            })?;

        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Ok(EntityId(id)),
            _ => Err(AppError::InvalidFormat {
                message: format!("id must be a positive integer, got `{raw}`"),
            }),
        }
    }
}
