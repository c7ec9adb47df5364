//! Daily stock rows and their save-status tracking

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-row persistence status, tracked optimistically by the scheduler.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        }
    }
}

/// One calendar day of one storage area.
///
/// `quantity_out` and `quantity_end` are user-entered; `None` means the
/// day has not been reported yet. `quantity_received` and `life_stock`
/// are derived by the reconciliation engine and never edited directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStockRow {
    pub date: NaiveDate,
    pub quantity_out: Option<Decimal>,
    pub quantity_end: Option<Decimal>,
    pub quantity_received: Decimal,
    pub dead_stock: Decimal,
    pub life_stock: Decimal,
    pub notes: Option<String>,
    #[serde(default)]
    pub save_status: SaveStatus,
}

impl DailyStockRow {
    /// A blank row for a day with no reported data yet.
    pub fn empty(date: NaiveDate, dead_stock: Decimal) -> Self {
        Self {
            date,
            quantity_out: None,
            quantity_end: None,
            quantity_received: Decimal::ZERO,
            dead_stock,
            life_stock: Decimal::ZERO - dead_stock,
            notes: None,
            save_status: SaveStatus::Idle,
        }
    }

    /// Whether the user has entered anything for this day.
    pub fn is_reported(&self) -> bool {
        self.quantity_out.is_some() || self.quantity_end.is_some() || self.notes.is_some()
    }
}

/// A row parsed from an imported worksheet, already date-normalized.
/// Received/life-stock columns from the sheet are ignored: both are
/// derived and get recomputed after the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRow {
    pub date: NaiveDate,
    pub quantity_out: Option<Decimal>,
    pub quantity_end: Option<Decimal>,
    pub dead_stock: Option<Decimal>,
    pub notes: Option<String>,
}

/// Editable cells of a daily row. `quantity_received` is deliberately
/// absent: it is fully determined by the balance chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockField {
    QuantityOut,
    QuantityEnd,
    DeadStock,
    Notes,
}

impl StockField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockField::QuantityOut => "quantity_out",
            StockField::QuantityEnd => "quantity_end",
            StockField::DeadStock => "dead_stock",
            StockField::Notes => "notes",
        }
    }
}
