//! HTTP handlers for the stock chart endpoint

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::services::chart::{build_chart, ChartSeries};
use crate::AppState;
use shared::{compute_metrics, validate_window};

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub year: i32,
    pub month: u32,
    pub window: Option<usize>,
}

/// Actuals plus depletion prognosis for one area and month
pub async fn get_chart(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<ChartSeries>> {
    let area = state.areas.get(plant_id).await?;
    let window = validate_window(query.window.unwrap_or(state.config.forecast.window_days))
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let view = state.ledger.select_period(&area, query.year, query.month).await?;

    let series = state
        .ledger
        .closing_series(plant_id, window as i64)
        .await?;
    let current_balance = series.last().map(|obs| obs.balance).unwrap_or_default();
    let dead_stock = (area.dead_stock > rust_decimal::Decimal::ZERO).then_some(area.dead_stock);
    let forecast = compute_metrics(&series, current_balance, window, dead_stock);

    Ok(Json(build_chart(&view.rows, &forecast)))
}
