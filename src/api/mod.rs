pub mod auth;
mod dashboard;
pub mod error;
mod items;
mod missing_reports;
mod orders;
mod reports;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (login is public, the rest resolve the session themselves)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    // Every handler below extracts `CurrentUser` or `StaffUser`
    let api_routes = Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        // Stationery items
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/:id", delete(items::delete_item))
        .route("/items/:id/stock", put(items::update_stock))
        // Retrievals and orders
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        // Missing item reports
        .route(
            "/missing-reports",
            get(missing_reports::list_missing_reports).post(missing_reports::create_missing_report),
        )
        // Stock reports
        .route("/reports/stock", get(reports::stock_report))
        .route("/reports/stock.pdf", get(reports::stock_report_pdf))
        .route("/reports/stock/print", get(reports::stock_report_print));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
