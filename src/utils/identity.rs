//! Caller identity extractor.
//!
//! Token issuance and validation live in the upstream gateway, which is
//! trusted to authenticate the user and forward their id in `X-User-Id`.
//! Ticket routes are owner-scoped on this id.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::utils::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::AuthError("Missing X-User-Id header".to_string()))?;

        header
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Caller)
            .ok_or_else(|| AppError::AuthError("Invalid X-User-Id header".to_string()))
    }
}
