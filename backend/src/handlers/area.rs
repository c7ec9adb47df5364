//! HTTP handlers for storage area endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::AppState;
use shared::StorageArea;

/// List all storage areas
pub async fn list_areas(State(state): State<AppState>) -> AppResult<Json<Vec<StorageArea>>> {
    let areas = state.areas.list().await?;
    Ok(Json(areas))
}

/// Get one storage area
pub async fn get_area(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
) -> AppResult<Json<StorageArea>> {
    let area = state.areas.get(plant_id).await?;
    Ok(Json(area))
}
