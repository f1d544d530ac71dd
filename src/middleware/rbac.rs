// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::rbac::PermissionAction,
};

/// A (module, action) pair a route requires.
pub trait PermissionDef: Send + Sync + 'static {
    fn module() -> &'static str;
    fn action() -> PermissionAction;

    fn slug() -> String {
        format!("{}:{}", Self::module(), Self::action().as_str())
    }
}

/// Rejects the request with 403 unless the user holds `T` in the active business.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        let tenant = parts
            .extensions
            .get::<TenantContext>()
            .ok_or(AppError::InvalidToken)?;

        let allowed = app_state
            .rbac_service
            .has_permission(&user.0, tenant.0, T::module(), T::action())
            .await?;

        if !allowed {
            tracing::warn!(user = %user.0.username, zid = tenant.0, permission = %T::slug(), "Permission denied");
            return Err(AppError::PermissionDenied(T::slug()));
        }

        Ok(RequirePermission(PhantomData))
    }
}

macro_rules! permission {
    ($name:ident, $module:literal, $action:ident) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn module() -> &'static str {
                $module
            }
            fn action() -> PermissionAction {
                PermissionAction::$action
            }
        }
    };
}

permission!(PermVoucherView, "vouchers", View);
permission!(PermPosCreate, "pos", Create);
permission!(PermSalesReturnView, "sales_return", View);
permission!(PermSalesReturnCreate, "sales_return", Create);
permission!(PermSalesReturnDelete, "sales_return", Delete);
permission!(PermDayEndView, "day_end_process", View);
permission!(PermDayEndCreate, "day_end_process", Create);
permission!(PermDayEndDelete, "day_end_process", Delete);
permission!(PermPoCreate, "po_create", Create);
permission!(PermGrnConfirm, "po_confirm", Edit);
