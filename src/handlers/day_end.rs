// src/handlers/day_end.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermDayEndCreate, PermDayEndDelete, PermDayEndView, RequirePermission},
        tenancy::TenantContext,
    },
    models::ledger::{DayEndOutcome, DayEndPayload, DayEndPreview, DayEndResponse, DayEndReversal},
};

// GET /api/sales/day-end/{date}
#[utoipa::path(
    get,
    path = "/api/sales/day-end/{date}",
    tag = "Day End",
    params(("date" = String, Path, description = "Business date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Sales aggregate, planned journal and processed voucher", body = DayEndPreview),
        (status = 403, description = "Missing day_end_process:view")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_day_end(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermDayEndView>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayEndPreview>, AppError> {
    let preview = app_state.day_end_service.preview(tenant.0, date).await?;
    Ok(Json(preview))
}

// POST /api/sales/day-end
#[utoipa::path(
    post,
    path = "/api/sales/day-end",
    tag = "Day End",
    request_body = DayEndPayload,
    responses(
        (status = 201, description = "Journal posted", body = DayEndResponse),
        (status = 409, description = "Date already processed; names the existing voucher", body = DayEndResponse),
        (status = 422, description = "No confirmed sales on the date", body = DayEndResponse),
        (status = 403, description = "Missing day_end_process:create")
    ),
    security(("api_jwt" = []))
)]
pub async fn process_day_end(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDayEndCreate>,
    Json(payload): Json<DayEndPayload>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state
        .day_end_service
        .process(tenant.0, payload.date, &user.username)
        .await?;

    let status = match outcome {
        DayEndOutcome::Posted { .. } => StatusCode::CREATED,
        DayEndOutcome::AlreadyProcessed { .. } => StatusCode::CONFLICT,
        DayEndOutcome::NoSales => StatusCode::UNPROCESSABLE_ENTITY,
    };

    Ok((status, Json(DayEndResponse::from(outcome))))
}

// DELETE /api/sales/day-end/{date}
#[utoipa::path(
    delete,
    path = "/api/sales/day-end/{date}",
    tag = "Day End",
    params(("date" = String, Path, description = "Business date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Day-end journal removed", body = DayEndReversal),
        (status = 404, description = "No day-end journal for the date"),
        (status = 403, description = "Missing day_end_process:delete")
    ),
    security(("api_jwt" = []))
)]
pub async fn reverse_day_end(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDayEndDelete>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayEndReversal>, AppError> {
    let reversal = app_state.day_end_service.reverse(tenant.0, date).await?;
    tracing::info!(user = %user.username, zid = tenant.0, %date, voucher = %reversal.voucher, "Day end reversed");
    Ok(Json(reversal))
}
