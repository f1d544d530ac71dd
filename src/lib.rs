// src/lib.rs

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{config::AppState, middleware::auth::auth_guard};

/// Builds the full HTTP surface. Everything except health, login and the
/// docs sits behind `auth_guard`.
pub fn router(app_state: AppState) -> Router {
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/me/permissions", get(handlers::auth::get_my_permissions))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let voucher_routes = Router::new()
        .route("/next", post(handlers::vouchers::next_voucher))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let sales_routes = Router::new()
        .route("/pos", post(handlers::sales::complete_pos_sale))
        .route("/day-end", post(handlers::day_end::process_day_end))
        .route(
            "/day-end/{date}",
            get(handlers::day_end::preview_day_end).delete(handlers::day_end::reverse_day_end),
        )
        .route("/returns", post(handlers::sales_return::create_sales_return))
        .route(
            "/returns/{number}",
            get(handlers::sales_return::get_sales_return).delete(handlers::sales_return::delete_sales_return),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let purchase_routes = Router::new()
        .route("/orders", post(handlers::purchase::create_purchase_order))
        .route("/grn/{grn}/confirm", post(handlers::purchase::confirm_grn))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/vouchers", voucher_routes)
        .nest("/api/sales", sales_routes)
        .nest("/api/purchase", purchase_routes)
        .merge(docs::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
