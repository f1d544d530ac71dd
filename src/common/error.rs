// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("No access to business {0}")]
    BusinessAccessDenied(i32),

    #[error("Missing permission '{0}'")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Request was well formed but a business rule rejected it.
    #[error("{0}")]
    BusinessRule(String),

    #[error("Failed to generate voucher number: {0}")]
    VoucherGeneration(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::JwtError(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::BusinessAccessDenied(_) | AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::VoucherGeneration(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidCredentials => "Invalid username, password or business ID.".to_string(),
            AppError::InvalidToken | AppError::JwtError(_) => {
                "Authentication token is invalid or missing.".to_string()
            }
            AppError::BusinessAccessDenied(zid) => {
                format!("You no longer have access to business {}.", zid)
            }
            AppError::PermissionDenied(slug) => {
                format!("You need the '{}' permission to perform this action.", slug)
            }
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::BusinessRule(msg) => msg,
            AppError::VoucherGeneration(ref detail) => {
                tracing::error!("Voucher generation failed: {}", detail);
                "Failed to generate voucher number.".to_string()
            }
            // Everything else is a 500; log the detail, return a generic message.
            ref e => {
                tracing::error!("Internal server error: {}", e);
                "An unexpected error occurred.".to_string()
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_failures_map_to_client_statuses() {
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::BusinessRule("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::BusinessAccessDenied(100001).status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn voucher_failures_are_server_errors() {
        let err = AppError::VoucherGeneration("deadlock detected".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Failed to generate voucher number"));
    }
}
