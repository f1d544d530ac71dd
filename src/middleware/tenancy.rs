// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::common::error::AppError;

/// The business (ZID) the current request operates on, taken from the token.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub i32);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or(AppError::InvalidToken)
    }
}
