// src/handlers/vouchers.rs

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{PermVoucherView, RequirePermission},
        tenancy::TenantContext,
    },
    models::voucher::{NextVoucherPayload, VoucherPreview},
};

// POST /api/vouchers/next
#[utoipa::path(
    post,
    path = "/api/vouchers/next",
    tag = "Vouchers",
    request_body = NextVoucherPayload,
    responses(
        (status = 200, description = "Number the next document of this series would receive", body = VoucherPreview),
        (status = 403, description = "Missing vouchers:view"),
        (status = 500, description = "Failed to generate voucher number")
    ),
    security(("api_jwt" = []))
)]
pub async fn next_voucher(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermVoucherView>,
    Json(payload): Json<NextVoucherPayload>,
) -> Result<Json<VoucherPreview>, AppError> {
    let voucher = app_state
        .voucher_service
        .preview(&app_state.db_pool, tenant.0, payload.series, Utc::now().date_naive())
        .await?;

    Ok(Json(VoucherPreview { series: payload.series, voucher }))
}
