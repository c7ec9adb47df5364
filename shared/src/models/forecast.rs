//! Forecast view models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived forecast for one storage area. Never persisted; recomputed
/// from the closing-balance series on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastSnapshot {
    /// Mean of strictly positive day-over-day balance decreases
    pub average_daily_outflow: Decimal,
    /// `None` when the balance series is flat or growing
    pub days_remaining: Option<i64>,
    pub safety_stock: Decimal,
    pub dead_stock: Decimal,
    /// Projected date the balance reaches safety stock; `None` when
    /// consumption is zero
    pub predicted_critical_date: Option<NaiveDate>,
}

/// One observation of the closing-balance series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BalanceObservation {
    pub date: NaiveDate,
    pub balance: Decimal,
}
