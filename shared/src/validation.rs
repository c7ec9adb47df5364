//! Validation utilities for the Packing-Plant Stock Ledger

use rust_decimal::Decimal;

/// User-entered quantities (outflow, closing balance, dead stock) must
/// not be negative. Derived columns are exempt: a negative received
/// quantity or life stock is a data-quality signal, not invalid input.
pub fn validate_quantity(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Validate a (year, month) pair before it becomes a period key.
pub fn validate_period(year: i32, month: u32) -> Result<(), &'static str> {
    if !(1..=12).contains(&month) {
        return Err("Month must be between 1 and 12");
    }
    if !(2000..=2100).contains(&year) {
        return Err("Year out of supported range");
    }
    Ok(())
}
