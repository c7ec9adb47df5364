//! Route definitions for the Packing Plant Stock Ledger

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Storage areas
        .nest("/areas", area_routes())
        // Daily stock ledger
        .nest("/stock", stock_routes())
        // Workbook import/export
        .nest("/workbooks", workbook_routes())
        // Notifications
        .nest("/notifications", notification_routes())
}

/// Storage area routes
fn area_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_areas))
        .route("/:plant_id", get(handlers::get_area))
}

/// Ledger routes, keyed by storage area
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/:plant_id/period", get(handlers::get_period))
        .route("/:plant_id/rows/:date", put(handlers::edit_cell))
        .route(
            "/:plant_id/opening-balance",
            put(handlers::set_opening_balance),
        )
        .route("/:plant_id/recompute", post(handlers::recompute_period))
        .route("/:plant_id/save", post(handlers::save_period))
        .route("/:plant_id/forecast", get(handlers::get_forecast))
        .route("/:plant_id/chart", get(handlers::get_chart))
}

/// Workbook import/export routes
fn workbook_routes() -> Router<AppState> {
    Router::new()
        .route("/areas/:plant_id/import", post(handlers::import_month))
        .route("/areas/:plant_id/export", get(handlers::export_month))
        .route("/areas/:plant_id/export.csv", get(handlers::export_month_csv))
        .route("/year/import", post(handlers::import_year))
        .route("/year/export", get(handlers::export_year))
}

/// Notification routes
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/:id/read", put(handlers::mark_notification_read))
}
