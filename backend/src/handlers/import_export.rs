//! HTTP handlers for workbook import and export

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::import_export::ImportReport;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: i32,
}

/// Import one workbook sheet into one area's month
pub async fn import_month(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<MonthQuery>,
    body: Bytes,
) -> AppResult<Json<ImportReport>> {
    let report = state
        .import_export
        .import_month(plant_id, query.year, query.month, &body)
        .await?;
    Ok(Json(report))
}

/// Import a yearly workbook, one sheet per storage area
pub async fn import_year(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
    body: Bytes,
) -> AppResult<Json<ImportReport>> {
    let report = state.import_export.import_year(query.year, &body).await?;
    Ok(Json(report))
}

/// Export one area's month as a workbook
pub async fn export_month(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<MonthQuery>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    let bytes = state
        .import_export
        .export_month(plant_id, query.year, query.month)
        .await?;
    let filename = format!("stock-{}-{:04}-{:02}.xlsx", plant_id, query.year, query.month);
    Ok((workbook_headers(&filename), bytes))
}

/// Export one area's month as CSV
pub async fn export_month_csv(
    State(state): State<AppState>,
    Path(plant_id): Path<i32>,
    Query(query): Query<MonthQuery>,
) -> AppResult<(HeaderMap, String)> {
    let csv = state
        .import_export
        .export_month_csv(plant_id, query.year, query.month)
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    Ok((headers, csv))
}

/// Export every area's year as one workbook
pub async fn export_year(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    let bytes = state.import_export.export_year(query.year).await?;
    let filename = format!("stock-{}.xlsx", query.year);
    Ok((workbook_headers(&filename), bytes))
}

fn workbook_headers(filename: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers
}
