// src/handlers.rs

pub mod auth;
pub mod day_end;
pub mod purchase;
pub mod sales;
pub mod sales_return;
pub mod vouchers;
