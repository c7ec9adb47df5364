//! HTTP handlers for the daily stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{EditCellInput, PeriodView};
use crate::AppState;
use shared::{DailyStockRow, PeriodKey};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct OpeningBalanceInput {
    pub opening_balance: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct SavePeriodInput {
    #[serde(default)]
    pub confirm: bool,
}

/// Load a period's reconciled rows for one storage area
pub async fn get_period(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PeriodView>> {
    let area = state.areas.get(plant_id).await?;
    let view = state.ledger.select_period(&area, query.year, query.month).await?;
    Ok(Json(view))
}

/// Edit one cell of a daily row; schedules a debounced row save
pub async fn edit_cell(
    State(state): State<AppState>,
    Path((plant_id, date)): Path<(i32, NaiveDate)>,
    Query(query): Query<PeriodQuery>,
    Json(input): Json<EditCellInput>,
) -> AppResult<Json<DailyStockRow>> {
    let key = PeriodKey::new(plant_id, query.year, query.month);
    let row = state.ledger.edit_cell(key, date, input).await?;
    state.scheduler.schedule_row_save(key, date);
    Ok(Json(row))
}

/// Set or clear the manual opening balance for a period
pub async fn set_opening_balance(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<PeriodQuery>,
    Json(input): Json<OpeningBalanceInput>,
) -> AppResult<Json<PeriodView>> {
    let key = PeriodKey::new(plant_id, query.year, query.month);
    let view = state
        .ledger
        .set_opening_balance(key, input.opening_balance)
        .await?;
    state.scheduler.compute_and_auto_save(key, false).await?;
    Ok(Json(view))
}

/// Re-derive the period and schedule an auto-save if anything changed
pub async fn recompute_period(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PeriodView>> {
    let key = PeriodKey::new(plant_id, query.year, query.month);
    state.scheduler.compute_and_auto_save(key, false).await?;
    state
        .ledger
        .view(key)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Period".to_string()))
}

/// Persist the whole period in one transaction. Requires an explicit
/// confirmation flag because it replaces every persisted row in the
/// period.
pub async fn save_period(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<PeriodQuery>,
    Json(input): Json<SavePeriodInput>,
) -> AppResult<Json<PeriodView>> {
    if !input.confirm {
        return Err(AppError::MissingSelection("confirmation".to_string()));
    }
    let key = PeriodKey::new(plant_id, query.year, query.month);
    let view = state.scheduler.save_whole_period(key).await?;
    Ok(Json(view))
}
