//! Tabular mapping between daily rows and worksheet cells
//!
//! Codec-neutral: the backend plugs an xlsx reader/writer behind these
//! types, while the header/date normalization and the row mapping stay
//! pure and testable here. Import headers tolerate the spellings seen
//! in the field; export always writes the canonical Indonesian columns.

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::models::{DailyStockRow, ImportedRow, StorageArea};
use crate::types::DateRange;

/// A cell as the ledger sees it
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

/// One worksheet: a name and a rectangular block of rows
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

/// Canonical columns of the stock sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalColumn {
    Date,
    QuantityReceived,
    QuantityOut,
    QuantityEnd,
    DeadStock,
    LifeStock,
    Notes,
}

/// Export header, in column order
pub const EXPORT_HEADERS: [&str; 7] = [
    "tanggal",
    "stok_diterima",
    "stok_keluar",
    "stok_akhir",
    "dead_stock",
    "life_stock",
    "notes",
];

/// Lowercase and strip everything that is not a letter or digit, so
/// "Stok Keluar", "stok_keluar" and "STOK-KELUAR" all normalize alike.
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Map a raw header cell to its canonical column via the synonym table.
pub fn canonical_column(raw: &str) -> Option<CanonicalColumn> {
    match normalize_header(raw).as_str() {
        "tanggal" | "date" | "tgl" => Some(CanonicalColumn::Date),
        "diterima" | "stokditerima" | "received" => Some(CanonicalColumn::QuantityReceived),
        "keluar" | "stokkeluar" | "out" => Some(CanonicalColumn::QuantityOut),
        "akhir" | "stokakhir" | "end" => Some(CanonicalColumn::QuantityEnd),
        "deadstock" => Some(CanonicalColumn::DeadStock),
        "lifestock" => Some(CanonicalColumn::LifeStock),
        "notes" | "catatan" => Some(CanonicalColumn::Notes),
        _ => None,
    }
}

/// Permissive date extraction from a cell.
///
/// Native date cells pass through; text is tried against the formats
/// seen in field exports; bare numbers are read as Excel serial dates.
/// The error carries the original rendering verbatim so the warning can
/// show the user exactly what was skipped.
pub fn parse_cell_date(cell: &CellValue) -> Result<NaiveDate, String> {
    match cell {
        CellValue::Date(date) => Ok(*date),
        CellValue::Text(text) => {
            const FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
            FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .ok_or_else(|| text.clone())
        }
        CellValue::Number(serial) => {
            // Excel serial dates count from 1899-12-30
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).ok_or_else(|| serial.to_string())?;
            if *serial < 1.0 || *serial > 200_000.0 {
                return Err(serial.to_string());
            }
            Ok(epoch + Duration::days(*serial as i64))
        }
        CellValue::Empty => Err(String::new()),
    }
}

fn cell_to_decimal(cell: &CellValue) -> Option<Decimal> {
    match cell {
        CellValue::Number(value) => Decimal::from_f64(*value),
        CellValue::Text(text) => text.replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn cell_to_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Text(text) => Some(text.clone()),
        CellValue::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn decimal_cell(value: Option<Decimal>) -> CellValue {
    match value.and_then(|d| d.to_f64()) {
        Some(number) => CellValue::Number(number),
        None => CellValue::Empty,
    }
}

/// Parse a stock sheet into date-normalized rows plus warnings.
///
/// The header row is located by scanning for the first row containing a
/// recognizable date column; anything above it (area name, date range)
/// is metadata and skipped. Rows whose date cannot be parsed are
/// skipped, reported with the original cell text, and never abort the
/// rest of the sheet.
pub fn sheet_to_rows(sheet: &Sheet) -> (Vec<ImportedRow>, Vec<String>) {
    let mut warnings = Vec::new();

    let Some(header_idx) = sheet.rows.iter().position(|row| {
        row.iter().any(|cell| {
            matches!(cell, CellValue::Text(text) if canonical_column(text) == Some(CanonicalColumn::Date))
        })
    }) else {
        warnings.push(format!("sheet {:?}: no header row found", sheet.name));
        return (Vec::new(), warnings);
    };

    let columns: Vec<Option<CanonicalColumn>> = sheet.rows[header_idx]
        .iter()
        .map(|cell| match cell {
            CellValue::Text(text) => canonical_column(text),
            _ => None,
        })
        .collect();

    let column_idx = |wanted: CanonicalColumn| {
        columns
            .iter()
            .position(|column| *column == Some(wanted))
    };

    let Some(date_idx) = column_idx(CanonicalColumn::Date) else {
        warnings.push(format!("sheet {:?}: no date column", sheet.name));
        return (Vec::new(), warnings);
    };
    let out_idx = column_idx(CanonicalColumn::QuantityOut);
    let end_idx = column_idx(CanonicalColumn::QuantityEnd);
    let dead_idx = column_idx(CanonicalColumn::DeadStock);
    let notes_idx = column_idx(CanonicalColumn::Notes);

    let mut rows = Vec::new();
    for (offset, raw) in sheet.rows[header_idx + 1..].iter().enumerate() {
        let cell = raw.get(date_idx).unwrap_or(&CellValue::Empty);
        if *cell == CellValue::Empty && raw.iter().all(|c| *c == CellValue::Empty) {
            continue; // trailing blank row
        }

        let date = match parse_cell_date(cell) {
            Ok(date) => date,
            Err(original) => {
                warnings.push(format!(
                    "sheet {:?} row {}: unparseable date {:?}",
                    sheet.name,
                    header_idx + offset + 2,
                    original
                ));
                continue;
            }
        };

        let pick = |idx: Option<usize>| idx.and_then(|i| raw.get(i)).cloned();
        rows.push(ImportedRow {
            date,
            quantity_out: pick(out_idx).as_ref().and_then(cell_to_decimal),
            quantity_end: pick(end_idx).as_ref().and_then(cell_to_decimal),
            dead_stock: pick(dead_idx).as_ref().and_then(cell_to_decimal),
            notes: pick(notes_idx).as_ref().and_then(cell_to_text),
        });
    }

    (rows, warnings)
}

/// Build the export sheet for one area and date range: two metadata
/// rows (area name, covered date range), then the canonical header and
/// one row per day.
pub fn build_sheet(area: &StorageArea, range: DateRange, rows: &[DailyStockRow]) -> Sheet {
    let mut cells: Vec<Vec<CellValue>> = Vec::with_capacity(rows.len() + 3);

    cells.push(vec![CellValue::Text(area.name.clone())]);
    cells.push(vec![
        CellValue::Text("Periode".to_string()),
        CellValue::Text(format!("{} - {}", range.start, range.end)),
    ]);
    cells.push(
        EXPORT_HEADERS
            .iter()
            .map(|h| CellValue::Text((*h).to_string()))
            .collect(),
    );

    for row in rows {
        cells.push(vec![
            CellValue::Date(row.date),
            decimal_cell(Some(row.quantity_received)),
            decimal_cell(row.quantity_out),
            decimal_cell(row.quantity_end),
            decimal_cell(Some(row.dead_stock)),
            decimal_cell(Some(row.life_stock)),
            match &row.notes {
                Some(notes) => CellValue::Text(notes.clone()),
                None => CellValue::Empty,
            },
        ]);
    }

    Sheet {
        name: area.sheet_name(),
        rows: cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_synonyms_normalize() {
        for raw in ["tanggal", "Tanggal", "DATE", "tgl"] {
            assert_eq!(canonical_column(raw), Some(CanonicalColumn::Date));
        }
        for raw in ["keluar", "Stok Keluar", "stok_keluar", "OUT"] {
            assert_eq!(canonical_column(raw), Some(CanonicalColumn::QuantityOut));
        }
        for raw in ["akhir", "stok-akhir", "End"] {
            assert_eq!(canonical_column(raw), Some(CanonicalColumn::QuantityEnd));
        }
        for raw in ["diterima", "Stok Diterima", "received"] {
            assert_eq!(
                canonical_column(raw),
                Some(CanonicalColumn::QuantityReceived)
            );
        }
        assert_eq!(canonical_column("catatan"), Some(CanonicalColumn::Notes));
        assert_eq!(canonical_column("gudang"), None);
    }

    #[test]
    fn date_parsing_is_permissive() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            parse_cell_date(&CellValue::Text("2024-03-07".into())),
            Ok(expected)
        );
        assert_eq!(
            parse_cell_date(&CellValue::Text("07/03/2024".into())),
            Ok(expected)
        );
        assert_eq!(parse_cell_date(&CellValue::Date(expected)), Ok(expected));
        // 2024-03-07 is Excel serial 45358
        assert_eq!(parse_cell_date(&CellValue::Number(45358.0)), Ok(expected));
    }

    #[test]
    fn unparseable_date_keeps_original_text() {
        assert_eq!(
            parse_cell_date(&CellValue::Text("next friday".into())),
            Err("next friday".to_string())
        );
    }

    #[test]
    fn sheet_parsing_skips_metadata_and_bad_rows() {
        let sheet = Sheet {
            name: "Packing Plant Dumai".to_string(),
            rows: vec![
                vec![CellValue::Text("Packing Plant Dumai".into())],
                vec![
                    CellValue::Text("Periode".into()),
                    CellValue::Text("2024-05-01 - 2024-05-31".into()),
                ],
                vec![
                    CellValue::Text("Tanggal".into()),
                    CellValue::Text("Stok Keluar".into()),
                    CellValue::Text("Stok Akhir".into()),
                ],
                vec![
                    CellValue::Text("2024-05-01".into()),
                    CellValue::Number(10.0),
                    CellValue::Number(90.0),
                ],
                vec![
                    CellValue::Text("not a date".into()),
                    CellValue::Number(1.0),
                    CellValue::Number(2.0),
                ],
            ],
        };

        let (rows, warnings) = sheet_to_rows(&sheet);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(rows[0].quantity_out, Some(Decimal::from(10)));
        assert_eq!(rows[0].quantity_end, Some(Decimal::from(90)));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not a date"));
    }

    #[test]
    fn export_import_round_trip() {
        let area = StorageArea {
            id: 7,
            name: "Packing Plant Dumai".to_string(),
            code: "PPD".to_string(),
            dead_stock: Decimal::from(50),
        };
        let key = crate::types::PeriodKey::new(7, 2024, 5);
        let range = DateRange {
            start: key.first_day().unwrap(),
            end: key.last_day().unwrap(),
        };

        let mut rows: Vec<DailyStockRow> = key
            .days()
            .into_iter()
            .map(|d| DailyStockRow::empty(d, area.dead_stock))
            .collect();
        rows[0].quantity_out = Some(Decimal::from(5));
        rows[0].quantity_end = Some(Decimal::from(120));
        rows[1].quantity_out = Some(Decimal::from(15));
        rows[1].quantity_end = Some(Decimal::from(105));
        rows[1].notes = Some("shift malam".to_string());

        let sheet = build_sheet(&area, range, &rows);
        let (imported, warnings) = sheet_to_rows(&sheet);

        assert!(warnings.is_empty());
        assert_eq!(imported.len(), rows.len());
        for (original, round_tripped) in rows.iter().zip(&imported) {
            assert_eq!(original.date, round_tripped.date);
            assert_eq!(original.quantity_out, round_tripped.quantity_out);
            assert_eq!(original.quantity_end, round_tripped.quantity_end);
            assert_eq!(original.notes, round_tripped.notes);
        }
    }
}
