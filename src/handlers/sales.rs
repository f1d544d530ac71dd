// src/handlers/sales.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermPosCreate, RequirePermission},
        tenancy::TenantContext,
    },
    models::sales::{PosSalePayload, PosSaleReceipt},
};

// POST /api/sales/pos
#[utoipa::path(
    post,
    path = "/api/sales/pos",
    tag = "Sales",
    request_body = PosSalePayload,
    responses(
        (status = 201, description = "Sale recorded and stock issued", body = PosSaleReceipt),
        (status = 400, description = "Invalid payload"),
        (status = 422, description = "Insufficient stock or invalid settlement"),
        (status = 403, description = "Missing pos:create")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_pos_sale(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermPosCreate>,
    Json(payload): Json<PosSalePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let receipt = app_state
        .sales_service
        .complete_sale(tenant.0, &user.username, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
