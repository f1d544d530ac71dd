// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_permissions,

        // --- Vouchers ---
        handlers::vouchers::next_voucher,

        // --- Sales ---
        handlers::sales::complete_pos_sale,

        // --- Day End ---
        handlers::day_end::preview_day_end,
        handlers::day_end::process_day_end,
        handlers::day_end::reverse_day_end,

        // --- Sales Returns ---
        handlers::sales_return::create_sales_return,
        handlers::sales_return::get_sales_return,
        handlers::sales_return::delete_sales_return,

        // --- Purchase ---
        handlers::purchase::create_purchase_order,
        handlers::purchase::confirm_grn,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,

            // --- RBAC ---
            models::rbac::PermissionAction,
            models::rbac::ModulePermissions,

            // --- Vouchers ---
            models::voucher::VoucherSeries,
            models::voucher::NextVoucherPayload,
            models::voucher::VoucherPreview,

            // --- Sales ---
            models::sales::PaymentMethod,
            models::sales::PosLinePayload,
            models::sales::PosSalePayload,
            models::sales::SaleTotals,
            models::sales::PosReceiptLine,
            models::sales::PosSaleReceipt,

            // --- Ledger ---
            models::ledger::AccountUsage,
            models::ledger::AccountSource,
            models::ledger::AccountType,
            models::ledger::BankAmount,
            models::ledger::SalesAggregate,
            models::ledger::JournalLine,
            models::ledger::DayEndPayload,
            models::ledger::DayEndOutcome,
            models::ledger::DayEndResponse,
            models::ledger::DayEndPreview,
            models::ledger::DayEndReversal,
            models::ledger::GlDetailRow,

            // --- Sales Returns ---
            models::sales_return::RefundMethod,
            models::sales_return::SalesReturnLinePayload,
            models::sales_return::SalesReturnPayload,
            models::sales_return::SalesReturnLine,
            models::sales_return::SalesReturnReceipt,
            models::sales_return::SalesReturnDeletion,
            models::sales_return::SalesReturnDetail,
            models::sales_return::ReturnHeader,
            models::sales_return::ReturnLineRow,

            // --- Purchase ---
            models::purchase::PurchaseLinePayload,
            models::purchase::PurchaseOrderPayload,
            models::purchase::PurchaseTotals,
            models::purchase::PurchaseOrderCreated,
            models::purchase::GrnConfirmation,
        )
    ),
    tags(
        (name = "Auth", description = "Login and tokens"),
        (name = "Users", description = "Current user and permissions"),
        (name = "Vouchers", description = "Document number series"),
        (name = "Sales", description = "Point of sale"),
        (name = "Day End", description = "Daily sales posting to the general ledger"),
        (name = "Sales Returns", description = "Customer returns back into stock"),
        (name = "Purchase", description = "Purchase orders and goods receipt confirmation")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users/me",
            "/api/users/me/permissions",
            "/api/vouchers/next",
            "/api/sales/pos",
            "/api/sales/day-end",
            "/api/sales/day-end/{date}",
            "/api/sales/returns",
            "/api/sales/returns/{number}",
            "/api/purchase/orders",
            "/api/purchase/grn/{grn}/confirm",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn day_end_outcomes_document_their_body() {
        let doc = ApiDoc::openapi();
        assert!(doc.components.as_ref().unwrap().schemas.contains_key("DayEndResponse"));

        let post = doc.paths.paths["/api/sales/day-end"].post.as_ref().unwrap();
        for status in ["201", "409", "422"] {
            match &post.responses.responses[status] {
                utoipa::openapi::RefOr::T(response) => assert!(!response.content.is_empty(), "{status} has no body"),
                utoipa::openapi::RefOr::Ref(_) => {}
            }
        }
    }
}
