//! Workbook import/export mapping tests
//!
//! Tests for the tabular layer including:
//! - Header synonym recognition
//! - Permissive date parsing with row-level warnings
//! - Sheet-to-area matching for yearly workbooks
//! - Export/import symmetry

use rust_decimal::Decimal;
use std::str::FromStr;

use chrono::NaiveDate;
use shared::{
    build_sheet, canonical_column, normalize_header, parse_cell_date, sheet_to_rows,
    CanonicalColumn, CellValue, DailyStockRow, DateRange, SaveStatus, Sheet, StorageArea,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn area(name: &str) -> StorageArea {
    StorageArea {
        id: 7,
        name: name.to_string(),
        code: "GU".to_string(),
        dead_stock: dec("50"),
    }
}

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Header synonyms in mixed case and spacing resolve to one column
    #[test]
    fn test_header_synonyms() {
        assert_eq!(normalize_header("  Stok Akhir "), "stokakhir");
        assert_eq!(
            canonical_column("Stok Akhir"),
            Some(CanonicalColumn::QuantityEnd)
        );
        assert_eq!(canonical_column("TANGGAL"), Some(CanonicalColumn::Date));
        assert_eq!(canonical_column("tgl"), Some(CanonicalColumn::Date));
        assert_eq!(
            canonical_column("stok keluar"),
            Some(CanonicalColumn::QuantityOut)
        );
        assert_eq!(canonical_column("Catatan"), Some(CanonicalColumn::Notes));
        assert_eq!(canonical_column("harga"), None);
    }

    /// Dates arrive as text in several formats or as Excel serials
    #[test]
    fn test_permissive_date_parsing() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();

        assert_eq!(parse_cell_date(&text("2024-03-07")), Ok(expected));
        assert_eq!(parse_cell_date(&text("07/03/2024")), Ok(expected));
        assert_eq!(parse_cell_date(&text("07-03-2024")), Ok(expected));
        assert_eq!(parse_cell_date(&CellValue::Number(45358.0)), Ok(expected));
        assert_eq!(parse_cell_date(&CellValue::Date(expected)), Ok(expected));
    }

    /// An unparseable date keeps the original text for the warning
    #[test]
    fn test_unparseable_date_reports_original() {
        let result = parse_cell_date(&text("tomorrow"));
        assert_eq!(result, Err("tomorrow".to_string()));
    }

    /// Metadata rows above the header and blank rows are skipped
    #[test]
    fn test_metadata_and_blank_rows_skipped() {
        let sheet = Sheet {
            name: "Gudang Utama".to_string(),
            rows: vec![
                vec![text("Gudang Utama")],
                vec![text("Periode"), text("2024-06-01 - 2024-06-30")],
                vec![text("tanggal"), text("stok keluar"), text("stok akhir")],
                vec![text("2024-06-01"), CellValue::Number(10.0), CellValue::Number(90.0)],
                vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
                vec![text("2024-06-02"), CellValue::Number(5.0), CellValue::Number(85.0)],
            ],
        };

        let (rows, warnings) = sheet_to_rows(&sheet);

        assert_eq!(rows.len(), 2);
        assert!(warnings.is_empty());
        assert_eq!(rows[0].quantity_out, Some(dec("10")));
        assert_eq!(rows[1].quantity_end, Some(dec("85")));
    }

    /// A bad date inside the data block warns but keeps the other rows
    #[test]
    fn test_bad_row_warns_and_continues() {
        let sheet = Sheet {
            name: "Gudang Utama".to_string(),
            rows: vec![
                vec![text("tanggal"), text("stok akhir")],
                vec![text("2024-06-01"), CellValue::Number(90.0)],
                vec![text("not a date"), CellValue::Number(80.0)],
                vec![text("2024-06-03"), CellValue::Number(70.0)],
            ],
        };

        let (rows, warnings) = sheet_to_rows(&sheet);

        assert_eq!(rows.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not a date"));
        assert!(warnings[0].contains("Gudang Utama"));
    }

    /// Sheet names match their area case-insensitively, including the
    /// 31-character truncation applied on export
    #[test]
    fn test_sheet_matching() {
        let short = area("Gudang Utama");
        assert!(short.matches_sheet("gudang utama"));
        assert!(short.matches_sheet("  Gudang Utama  "));
        assert!(!short.matches_sheet("Silo Timur"));

        let long = area("Gudang Penyimpanan Bahan Baku Utara");
        assert_eq!(long.sheet_name().chars().count(), 31);
        assert!(long.matches_sheet(&long.sheet_name()));
    }

    /// An exported sheet re-imports to the same reported values
    #[test]
    fn test_export_import_symmetry() {
        let storage = area("Gudang Utama");
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
        };
        let rows = vec![
            DailyStockRow {
                date: range.start,
                quantity_out: Some(dec("10")),
                quantity_end: Some(dec("90")),
                quantity_received: dec("100"),
                dead_stock: dec("50"),
                life_stock: dec("40"),
                notes: Some("opname".to_string()),
                save_status: SaveStatus::Saved,
            },
            DailyStockRow {
                date: range.end,
                quantity_out: Some(dec("5")),
                quantity_end: Some(dec("85")),
                quantity_received: dec("0"),
                dead_stock: dec("50"),
                life_stock: dec("35"),
                notes: None,
                save_status: SaveStatus::Saved,
            },
        ];

        let sheet = build_sheet(&storage, range, &rows);
        let (imported, warnings) = sheet_to_rows(&sheet);

        assert!(warnings.is_empty());
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].date, rows[0].date);
        assert_eq!(imported[0].quantity_out, rows[0].quantity_out);
        assert_eq!(imported[0].quantity_end, rows[0].quantity_end);
        assert_eq!(imported[0].notes, rows[0].notes);
        assert_eq!(imported[1].quantity_end, rows[1].quantity_end);
    }
}
