//! HTTP handlers for the Packing Plant Stock Ledger

pub mod area;
pub mod chart;
pub mod forecast;
pub mod health;
pub mod import_export;
pub mod notification;
pub mod stock;

pub use area::{get_area, list_areas};
pub use chart::get_chart;
pub use forecast::get_forecast;
pub use health::health_check;
pub use import_export::{
    export_month, export_month_csv, export_year, import_month, import_year,
};
pub use notification::{list_notifications, mark_notification_read};
pub use stock::{edit_cell, get_period, recompute_period, save_period, set_opening_balance};
