pub mod auth;
pub mod inventory;
pub mod ledger;
pub mod purchase;
pub mod rbac;
pub mod sales;
pub mod sales_return;
pub mod tenancy;
pub mod voucher;
