// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    #[schema(example = "counter01")]
    pub username: String,

    pub email: Option<String>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Username is required."))]
    #[schema(example = "counter01")]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,

    #[validate(range(min = 1, message = "Business ID is required."))]
    #[schema(example = 100001)]
    pub business_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[schema(example = 100001)]
    pub zid: i32,
    #[schema(example = "HMBR Gulshan")]
    pub business_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: User,
    pub zid: i32,
}

// JWT payload. `zid` is the business selected at login.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub zid: i32,
    pub exp: usize,
    pub iat: usize,
}
