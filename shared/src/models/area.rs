//! Storage area master data

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A packing-plant storage area. Master data is maintained elsewhere;
/// the ledger reads it for display names and dead-stock defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageArea {
    pub id: i32,
    pub name: String,
    /// Short code used in exports and logs (e.g., "PPI")
    pub code: String,
    /// Minimum non-usable balance configured for this area
    pub dead_stock: Decimal,
}

impl StorageArea {
    /// Sheet name for workbook exports. Spreadsheet sheet names are
    /// limited to 31 characters.
    pub fn sheet_name(&self) -> String {
        self.name.chars().take(31).collect()
    }

    /// Case- and whitespace-insensitive match against an imported sheet
    /// name. Sheet names may already have been truncated on export.
    pub fn matches_sheet(&self, sheet_name: &str) -> bool {
        let normalized = sheet_name.trim().to_lowercase();
        let own = self.name.trim().to_lowercase();
        own == normalized || self.sheet_name().trim().to_lowercase() == normalized
    }
}
