// src/handlers/purchase.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermGrnConfirm, PermPoCreate, RequirePermission},
        tenancy::TenantContext,
    },
    models::purchase::{GrnConfirmation, PurchaseOrderCreated, PurchaseOrderPayload},
};

// POST /api/purchase/orders
#[utoipa::path(
    post,
    path = "/api/purchase/orders",
    tag = "Purchase",
    request_body = PurchaseOrderPayload,
    responses(
        (status = 201, description = "Order and its open GRN created", body = PurchaseOrderCreated),
        (status = 400, description = "Invalid payload"),
        (status = 422, description = "Discount exceeds the order value"),
        (status = 403, description = "Missing po_create:create")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermPoCreate>,
    Json(payload): Json<PurchaseOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state
        .purchase_service
        .create_purchase_order(tenant.0, &user.username, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

// POST /api/purchase/grn/{grn}/confirm
#[utoipa::path(
    post,
    path = "/api/purchase/grn/{grn}/confirm",
    tag = "Purchase",
    params(("grn" = String, Path, description = "GRN number, e.g. GRN-000031")),
    responses(
        (status = 200, description = "GRN received into stock", body = GrnConfirmation),
        (status = 404, description = "GRN not found"),
        (status = 409, description = "GRN already processed"),
        (status = 422, description = "GRN has no lines"),
        (status = 403, description = "Missing po_confirm:edit")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm_grn(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermGrnConfirm>,
    Path(grn): Path<String>,
) -> Result<Json<GrnConfirmation>, AppError> {
    let confirmation = app_state
        .purchase_service
        .confirm_grn(tenant.0, &grn, &user.username)
        .await?;

    Ok(Json(confirmation))
}
