//! Consumption forecasting
//!
//! Summarizes the recent closing-balance series of one storage area into
//! a rolling average daily outflow, a safety-stock floor, and a
//! projected stock-out date. Pure and deterministic; the backend feeds
//! it the persisted series and the area's configured dead stock.

use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{BalanceObservation, ForecastSnapshot};

/// Default rolling window, in observations.
pub const DEFAULT_WINDOW_DAYS: usize = 14;

/// Windows the UI offers; anything else is rejected.
pub const ALLOWED_WINDOWS: [usize; 3] = [7, 14, 30];

/// Safety stock sits a fixed 20% above dead stock.
pub fn safety_stock_factor() -> Decimal {
    Decimal::new(12, 1)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("forecast window must be one of 7, 14, or 30 days (got {0})")]
pub struct InvalidWindow(pub usize);

pub fn validate_window(days: usize) -> Result<usize, InvalidWindow> {
    if ALLOWED_WINDOWS.contains(&days) {
        Ok(days)
    } else {
        Err(InvalidWindow(days))
    }
}

/// Compute the forecast over the last `window` observations.
///
/// The average daily outflow is the mean of the strictly positive
/// day-over-day decreases; days where the balance held or grew (restock
/// days) are excluded rather than averaged in as zero, so restocks do
/// not dilute the consumption rate.
///
/// Dead stock comes from the caller's override when present, else from
/// the minimum strictly-positive balance seen in the window (a heuristic
/// floor for areas with no configured value).
pub fn compute_metrics(
    series: &[BalanceObservation],
    current_balance: Decimal,
    window: usize,
    dead_stock_override: Option<Decimal>,
) -> ForecastSnapshot {
    let start = series.len().saturating_sub(window);
    let observed = &series[start..];

    let drops: Vec<Decimal> = observed
        .windows(2)
        .map(|pair| pair[0].balance - pair[1].balance)
        .filter(|delta| *delta > Decimal::ZERO)
        .collect();

    let average_daily_outflow = if drops.is_empty() {
        Decimal::ZERO
    } else {
        drops.iter().sum::<Decimal>() / Decimal::from(drops.len() as u64)
    };

    let dead_stock = dead_stock_override.unwrap_or_else(|| {
        observed
            .iter()
            .map(|obs| obs.balance)
            .filter(|balance| *balance > Decimal::ZERO)
            .min()
            .unwrap_or(Decimal::ZERO)
    });

    let safety_stock = (dead_stock * safety_stock_factor()).ceil();

    let days_remaining = if average_daily_outflow > Decimal::ZERO {
        (current_balance / average_daily_outflow).floor().to_i64()
    } else {
        None
    };

    let predicted_critical_date = if average_daily_outflow > Decimal::ZERO {
        observed.last().map(|last| {
            let offset = ((current_balance - safety_stock) / average_daily_outflow)
                .ceil()
                .to_i64()
                .unwrap_or(0);
            if offset <= 0 {
                // Already at or below safety stock
                last.date
            } else {
                last.date + Duration::days(offset)
            }
        })
    } else {
        None
    };

    ForecastSnapshot {
        average_daily_outflow,
        days_remaining,
        safety_stock,
        dead_stock,
        predicted_critical_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(balances: &[i64]) -> Vec<BalanceObservation> {
        balances
            .iter()
            .enumerate()
            .map(|(i, b)| BalanceObservation {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + Duration::days(i as i64),
                balance: Decimal::from(*b),
            })
            .collect()
    }

    #[test]
    fn steady_decline_forecast() {
        // 8 balances strictly decreasing by 10/day
        let obs = series(&[220, 210, 200, 190, 180, 170, 160, 150]);
        let current = Decimal::from(150);
        let snap = compute_metrics(&obs, current, DEFAULT_WINDOW_DAYS, Some(Decimal::from(50)));

        assert_eq!(snap.average_daily_outflow, Decimal::from(10));
        assert_eq!(snap.safety_stock, Decimal::from(60));
        assert_eq!(snap.dead_stock, Decimal::from(50));
        assert_eq!(snap.days_remaining, Some(15));
        // last date + ceil((150 - 60) / 10) = last + 9 days
        assert_eq!(
            snap.predicted_critical_date,
            Some(NaiveDate::from_ymd_opt(2024, 6, 17).unwrap())
        );
    }

    #[test]
    fn restock_days_excluded_from_average() {
        // drops of 10 and 20; the +50 restock must not dilute the mean
        let obs = series(&[100, 90, 140, 120]);
        let snap = compute_metrics(&obs, Decimal::from(120), 14, None);
        assert_eq!(snap.average_daily_outflow, Decimal::from(15));
    }

    #[test]
    fn flat_series_is_not_critical() {
        let obs = series(&[100, 100, 100]);
        let snap = compute_metrics(&obs, Decimal::from(100), 14, None);
        assert_eq!(snap.average_daily_outflow, Decimal::ZERO);
        assert_eq!(snap.days_remaining, None);
        assert_eq!(snap.predicted_critical_date, None);
    }

    #[test]
    fn dead_stock_heuristic_uses_min_positive_balance() {
        let obs = series(&[100, 0, 40, 80]);
        let snap = compute_metrics(&obs, Decimal::from(80), 14, None);
        assert_eq!(snap.dead_stock, Decimal::from(40));
        assert_eq!(snap.safety_stock, Decimal::from(48));
    }

    #[test]
    fn at_or_below_safety_stock_predicts_last_observed_date() {
        let obs = series(&[70, 60, 50]);
        let snap = compute_metrics(&obs, Decimal::from(50), 14, Some(Decimal::from(50)));
        // safety = 60 >= current 50, so the critical date is already here
        assert_eq!(snap.predicted_critical_date, Some(obs[2].date));
    }

    #[test]
    fn window_limits_observations() {
        // only the last 7 observations count; the early crash is outside
        let obs = series(&[1000, 100, 90, 80, 70, 60, 50, 40]);
        let snap = compute_metrics(&obs, Decimal::from(40), 7, None);
        assert_eq!(snap.average_daily_outflow, Decimal::from(10));
    }

    #[test]
    fn window_validation() {
        assert_eq!(validate_window(7), Ok(7));
        assert_eq!(validate_window(14), Ok(14));
        assert_eq!(validate_window(30), Ok(30));
        assert_eq!(validate_window(10), Err(InvalidWindow(10)));
    }

    #[test]
    fn empty_series_yields_empty_snapshot() {
        let snap = compute_metrics(&[], Decimal::ZERO, 14, None);
        assert_eq!(snap.average_daily_outflow, Decimal::ZERO);
        assert_eq!(snap.days_remaining, None);
        assert_eq!(snap.predicted_critical_date, None);
    }
}
