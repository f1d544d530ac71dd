// src/services.rs

pub mod auth;
pub mod day_end_service;
pub mod inventory_service;
pub mod purchase_service;
pub mod rbac_service;
pub mod sales_return_service;
pub mod sales_service;
pub mod setup_service;
pub mod voucher_service;
