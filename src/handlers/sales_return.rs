// src/handlers/sales_return.rs

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
        rbac::{PermSalesReturnCreate, PermSalesReturnDelete, PermSalesReturnView, RequirePermission},
        tenancy::TenantContext,
    },
    models::sales_return::{SalesReturnDeletion, SalesReturnDetail, SalesReturnPayload, SalesReturnReceipt},
};

// POST /api/sales/returns
#[utoipa::path(
    post,
    path = "/api/sales/returns",
    tag = "Sales Returns",
    request_body = SalesReturnPayload,
    responses(
        (status = 201, description = "Return recorded, stock received back and journal posted", body = SalesReturnReceipt),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Referenced sales order not found"),
        (status = 422, description = "More returned than the order sold, or a credit refund without customer"),
        (status = 403, description = "Missing sales_return:create")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sales_return(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesReturnCreate>,
    Json(payload): Json<SalesReturnPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let receipt = app_state
        .sales_return_service
        .process(tenant.0, &user.username, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

// GET /api/sales/returns/{number}
#[utoipa::path(
    get,
    path = "/api/sales/returns/{number}",
    tag = "Sales Returns",
    params(("number" = String, Path, description = "Return number, e.g. SRE-000004")),
    responses(
        (status = 200, description = "Return header, lines and journal", body = SalesReturnDetail),
        (status = 404, description = "Return not found"),
        (status = 403, description = "Missing sales_return:view")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sales_return(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesReturnView>,
    Path(number): Path<String>,
) -> Result<Json<SalesReturnDetail>, AppError> {
    let detail = app_state.sales_return_service.detail(tenant.0, &number).await?;
    Ok(Json(detail))
}

// DELETE /api/sales/returns/{number}
#[utoipa::path(
    delete,
    path = "/api/sales/returns/{number}",
    tag = "Sales Returns",
    params(("number" = String, Path, description = "Return number, e.g. SRE-000004")),
    responses(
        (status = 200, description = "Return, its stock movements and journal removed", body = SalesReturnDeletion),
        (status = 404, description = "Return not found"),
        (status = 403, description = "Missing sales_return:delete")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_sales_return(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesReturnDelete>,
    Path(number): Path<String>,
) -> Result<Json<SalesReturnDeletion>, AppError> {
    let deletion = app_state.sales_return_service.delete(tenant.0, &number).await?;
    tracing::info!(user = %user.username, zid = tenant.0, return_number = %number, "Sales return deleted");
    Ok(Json(deletion))
}
