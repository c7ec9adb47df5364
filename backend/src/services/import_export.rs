//! Workbook import and export
//!
//! Imports merge into the in-memory period store only; nothing reaches
//! the backing store until a save is scheduled (the `import.auto_save`
//! flag) or the user explicitly saves the period. Export mirrors the
//! import layout so a freshly exported workbook re-imports cleanly.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use shared::{
    build_sheet, life_stock, sheet_to_rows, DailyStockRow, DateRange, ImportedRow, PeriodKey,
    SaveStatus, Sheet, StorageArea,
};

use crate::error::{AppError, AppResult};
use crate::services::area::AreaService;
use crate::services::ledger::{LedgerService, StockRecord};
use crate::services::notification::NotificationService;
use crate::services::scheduler::SaveScheduler;
use crate::services::workbook;

/// What an import did, and what it skipped
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub merged_rows: usize,
    pub periods: Vec<PeriodKey>,
    pub skipped_sheets: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct ImportExportService {
    areas: AreaService,
    ledger: LedgerService,
    scheduler: SaveScheduler,
    notifications: NotificationService,
    auto_save: bool,
}

impl ImportExportService {
    pub fn new(
        areas: AreaService,
        ledger: LedgerService,
        scheduler: SaveScheduler,
        notifications: NotificationService,
        auto_save: bool,
    ) -> Self {
        Self {
            areas,
            ledger,
            scheduler,
            notifications,
            auto_save,
        }
    }

    // ------------------------------------------------------------------
    // Import
    // ------------------------------------------------------------------

    /// Import one workbook sheet into one (area, year, month) period.
    pub async fn import_month(
        &self,
        plant_id: i32,
        year: i32,
        month: u32,
        bytes: &[u8],
    ) -> AppResult<ImportReport> {
        let area = self.areas.get(plant_id).await?;
        let key = PeriodKey::new(plant_id, year, month);

        let sheets = workbook::parse_workbook(bytes)?;
        let sheet = sheets
            .first()
            .ok_or_else(|| AppError::Workbook("workbook has no sheets".to_string()))?;

        let (rows, mut warnings) = sheet_to_rows(sheet);
        let (in_period, out_of_period): (Vec<_>, Vec<_>) =
            rows.into_iter().partition(|row| key.contains(row.date));
        for row in &out_of_period {
            warnings.push(format!(
                "sheet {:?}: {} is outside {:04}-{:02}, skipped",
                sheet.name, row.date, year, month
            ));
        }

        self.ledger.select_period(&area, year, month).await?;
        let merged = self.ledger.merge_import(key, &in_period).await?;

        let report = ImportReport {
            merged_rows: merged,
            periods: vec![key],
            skipped_sheets: Vec::new(),
            warnings,
        };
        self.finish_import(&report, Some(plant_id)).await?;
        Ok(report)
    }

    /// Import a yearly workbook: each sheet is matched to an area by
    /// display name and its rows are distributed into (area, month)
    /// periods by parsed date. Unmatched sheets are skipped and
    /// reported; the rest of the workbook still imports.
    pub async fn import_year(&self, year: i32, bytes: &[u8]) -> AppResult<ImportReport> {
        let areas = self.areas.list().await?;
        let sheets = workbook::parse_workbook(bytes)?;

        let mut report = ImportReport::default();
        for sheet in &sheets {
            match areas.iter().find(|area| area.matches_sheet(&sheet.name)) {
                Some(area) => self.import_area_sheet(area, year, sheet, &mut report).await?,
                None => report.skipped_sheets.push(sheet.name.clone()),
            }
        }

        self.finish_import(&report, None).await?;
        Ok(report)
    }

    async fn import_area_sheet(
        &self,
        area: &StorageArea,
        year: i32,
        sheet: &Sheet,
        report: &mut ImportReport,
    ) -> AppResult<()> {
        let (rows, warnings) = sheet_to_rows(sheet);
        report.warnings.extend(warnings);

        let mut by_month: BTreeMap<u32, Vec<ImportedRow>> = BTreeMap::new();
        for row in rows {
            if row.date.year() == year {
                by_month.entry(row.date.month()).or_default().push(row);
            } else {
                report.warnings.push(format!(
                    "sheet {:?}: {} is outside {}, skipped",
                    sheet.name, row.date, year
                ));
            }
        }

        for (month, rows) in by_month {
            let key = PeriodKey::new(area.id, year, month);
            self.ledger.select_period(area, year, month).await?;
            report.merged_rows += self.ledger.merge_import(key, &rows).await?;
            report.periods.push(key);
        }
        Ok(())
    }

    /// Shared import epilogue: optional auto-save scheduling plus the
    /// warning notification listing everything that was skipped.
    async fn finish_import(&self, report: &ImportReport, plant_id: Option<i32>) -> AppResult<()> {
        if self.auto_save {
            for key in &report.periods {
                self.scheduler.compute_and_auto_save(*key, false).await?;
            }
        }

        if !report.skipped_sheets.is_empty() || !report.warnings.is_empty() {
            let mut detail = Vec::new();
            for sheet in &report.skipped_sheets {
                detail.push(format!("sheet {:?} matches no storage area", sheet));
            }
            detail.extend(report.warnings.iter().cloned());
            self.notifications
                .record_import_warning(plant_id, &detail.join("; "))
                .await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Export one period as a single-sheet workbook.
    pub async fn export_month(&self, plant_id: i32, year: i32, month: u32) -> AppResult<Vec<u8>> {
        let area = self.areas.get(plant_id).await?;
        let view = self.ledger.select_period(&area, year, month).await?;
        let range = period_range(view.key)?;
        let sheet = build_sheet(&area, range, &view.rows);
        workbook::write_workbook(&[sheet])
    }

    /// Export one period as CSV (flat variant of the monthly export).
    pub async fn export_month_csv(&self, plant_id: i32, year: i32, month: u32) -> AppResult<String> {
        let area = self.areas.get(plant_id).await?;
        let view = self.ledger.select_period(&area, year, month).await?;
        let records: Vec<StockRecord> = view
            .rows
            .iter()
            .map(|row| self.ledger.to_record(plant_id, row))
            .collect();
        export_to_csv(&records)
    }

    /// Export a whole year: one workbook, one sheet per area, each sheet
    /// holding the area's persisted rows for the year.
    pub async fn export_year(&self, year: i32) -> AppResult<Vec<u8>> {
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Err(AppError::ValidationError(format!("Invalid year {}", year)));
        };
        let range = DateRange { start, end };

        let mut sheets = Vec::new();
        for area in self.areas.list().await? {
            let records = self.ledger.fetch_records(area.id, start, end).await?;
            let rows: Vec<DailyStockRow> = records.iter().map(record_to_row).collect();
            sheets.push(build_sheet(&area, range, &rows));
        }

        if sheets.is_empty() {
            return Err(AppError::NotFound("Storage area".to_string()));
        }
        workbook::write_workbook(&sheets)
    }
}

fn period_range(key: PeriodKey) -> AppResult<DateRange> {
    match (key.first_day(), key.last_day()) {
        (Some(start), Some(end)) => Ok(DateRange { start, end }),
        _ => Err(AppError::ValidationError(format!(
            "Invalid period {}-{}",
            key.year, key.month
        ))),
    }
}

fn record_to_row(record: &StockRecord) -> DailyStockRow {
    let dead_stock = record.dead_stock.unwrap_or_default();
    DailyStockRow {
        date: record.tanggal,
        quantity_out: record.stok_keluar,
        quantity_end: record.stok_akhir,
        quantity_received: record.stok_diterima.unwrap_or_default(),
        dead_stock,
        life_stock: record
            .life_stock
            .unwrap_or_else(|| life_stock(record.stok_akhir, dead_stock)),
        notes: record.notes.clone(),
        save_status: SaveStatus::Saved,
    }
}

/// Serialize records as CSV
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let csv_data = String::from_utf8(
        wtr.into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
    )
    .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
    Ok(csv_data)
}
