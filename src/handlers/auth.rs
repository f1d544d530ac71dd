// src/handlers/auth.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        auth::{AuthResponse, LoginPayload, MeResponse},
        rbac::ModulePermissions,
    },
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token issued for the selected business", body = AuthResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login(&payload.username, &payload.password, payload.business_id)
        .await?;

    Ok(Json(response))
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user and active business", body = MeResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser, tenant: TenantContext) -> Json<MeResponse> {
    Json(MeResponse { user, zid: tenant.0 })
}

// GET /api/users/me/permissions
#[utoipa::path(
    get,
    path = "/api/users/me/permissions",
    tag = "Users",
    responses(
        (status = 200, description = "Granted actions per module in the active business", body = ModulePermissions),
        (status = 401, description = "Not authenticated")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<ModulePermissions>, AppError> {
    let permissions = app_state.rbac_service.module_permissions(&user, tenant.0).await?;
    Ok(Json(permissions))
}
