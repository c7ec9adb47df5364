//! HTTP handlers for stock depletion forecasting

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::AppState;
use shared::{compute_metrics, validate_window, ForecastSnapshot};

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    /// Rolling window in days; one of 7, 14, or 30.
    pub window: Option<usize>,
}

/// Forecast for one storage area from its persisted closing balances
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<ForecastQuery>,
) -> AppResult<Json<ForecastSnapshot>> {
    let area = state.areas.get(plant_id).await?;
    let window = validate_window(query.window.unwrap_or(state.config.forecast.window_days))
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let series = state
        .ledger
        .closing_series(plant_id, window as i64)
        .await?;
    let current_balance = series
        .last()
        .map(|obs| obs.balance)
        .unwrap_or_default();

    let dead_stock = (area.dead_stock > rust_decimal::Decimal::ZERO).then_some(area.dead_stock);
    let snapshot = compute_metrics(&series, current_balance, window, dead_stock);
    Ok(Json(snapshot))
}
