//! Narrow spreadsheet codec
//!
//! The only place in the backend that touches a spreadsheet library.
//! Parses xlsx bytes into the codec-neutral `Sheet`/`CellValue` model
//! and writes that model back out. Dates are written as ISO text and
//! re-parsed on import, which keeps the two sides symmetric.

use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;

use shared::{CellValue, Sheet};

use crate::error::{AppError, AppResult};

/// Parse an xlsx workbook into sheets of cell rows.
pub fn parse_workbook(bytes: &[u8]) -> AppResult<Vec<Sheet>> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook: Xlsx<_> = Xlsx::new(cursor)
        .map_err(|e| AppError::Workbook(format!("cannot open workbook: {}", e)))?;

    let mut sheets = Vec::new();
    for (name, range) in workbook.worksheets() {
        let rows = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect())
            .collect();
        sheets.push(Sheet { name, rows });
    }

    if sheets.is_empty() {
        return Err(AppError::Workbook("workbook has no sheets".to_string()));
    }
    Ok(sheets)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Number(if *value { 1.0 } else { 0.0 }),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => CellValue::Date(datetime.date()),
            None => CellValue::Number(value.as_f64()),
        },
        Data::DateTimeIso(text) => match text
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        {
            Some(date) => CellValue::Date(date),
            None => CellValue::Text(text.clone()),
        },
        Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(error) => CellValue::Text(format!("{:?}", error)),
    }
}

/// Write sheets into a new xlsx workbook, returned as bytes.
pub fn write_workbook(sheets: &[Sheet]) -> AppResult<Vec<u8>> {
    let mut workbook = rust_xlsxwriter::Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        let name: String = sheet.name.chars().take(31).collect();
        worksheet
            .set_name(name.as_str())
            .map_err(|e| AppError::Workbook(format!("invalid sheet name {:?}: {}", name, e)))?;

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let (row_idx, col_idx) = (row_idx as u32, col_idx as u16);
                let written = match cell {
                    CellValue::Empty => Ok(&mut *worksheet),
                    CellValue::Text(text) => {
                        worksheet.write_string(row_idx, col_idx, text.as_str())
                    }
                    CellValue::Number(value) => worksheet.write_number(row_idx, col_idx, *value),
                    CellValue::Date(date) => worksheet.write_string(
                        row_idx,
                        col_idx,
                        date.format("%Y-%m-%d").to_string(),
                    ),
                };
                written.map_err(|e| AppError::Workbook(format!("write cell: {}", e)))?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| AppError::Workbook(format!("serialize workbook: {}", e)))
}
