//! Chart series assembly
//!
//! Turns a period's reconciled rows plus a forecast snapshot into the
//! parallel arrays a charting frontend consumes. Pure data shaping;
//! no storage access.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::Serialize;

use shared::{DailyStockRow, ForecastSnapshot};

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    /// ISO dates, one per calendar day, reported days first then the
    /// projected tail.
    pub labels: Vec<String>,
    /// Daily outflow for reported days, `None` past the last report.
    pub outflow: Vec<Option<Decimal>>,
    /// Closing balance for reported days, `None` past the last report.
    pub closing: Vec<Option<Decimal>>,
    /// Projected closing balance. `None` for days before the last
    /// report, then the balance drained at the average daily outflow.
    pub prognosis: Vec<Option<Decimal>>,
    /// Whether the (actual or projected) balance sits at or below the
    /// safety stock on that day.
    pub below_safety: Vec<bool>,
}

/// Build the chart series for a period. The projected tail runs from
/// the last reported day until the projected balance reaches zero or
/// the forecast has nothing to project.
pub fn build_chart(rows: &[DailyStockRow], forecast: &ForecastSnapshot) -> ChartSeries {
    let mut series = ChartSeries {
        labels: Vec::new(),
        outflow: Vec::new(),
        closing: Vec::new(),
        prognosis: Vec::new(),
        below_safety: Vec::new(),
    };

    let reported: Vec<&DailyStockRow> = rows.iter().filter(|row| row.is_reported()).collect();
    for row in &reported {
        let closing = row.quantity_end.unwrap_or_default();
        series.labels.push(row.date.format("%Y-%m-%d").to_string());
        series.outflow.push(row.quantity_out);
        series.closing.push(Some(closing));
        series.prognosis.push(None);
        series.below_safety.push(closing <= forecast.safety_stock);
    }

    let Some(last) = reported.last() else {
        return series;
    };
    if forecast.average_daily_outflow <= Decimal::ZERO {
        return series;
    }

    // Project forward from the last reported balance; the prognosis
    // line starts at that balance so the two lines join up.
    let mut balance = last.quantity_end.unwrap_or_default();
    if let Some(prognosis) = series.prognosis.last_mut() {
        *prognosis = Some(balance);
    }

    let mut date = last.date;
    while balance > Decimal::ZERO {
        date = date + Duration::days(1);
        balance = (balance - forecast.average_daily_outflow).max(Decimal::ZERO);
        series.labels.push(date.format("%Y-%m-%d").to_string());
        series.outflow.push(None);
        series.closing.push(None);
        series.prognosis.push(Some(balance));
        series.below_safety.push(balance <= forecast.safety_stock);
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::SaveStatus;

    fn row(day: u32, out: i64, end: i64) -> DailyStockRow {
        DailyStockRow {
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            quantity_out: Some(Decimal::from(out)),
            quantity_end: Some(Decimal::from(end)),
            quantity_received: Decimal::ZERO,
            dead_stock: Decimal::from(5),
            life_stock: Decimal::from(end - 5),
            notes: None,
            save_status: SaveStatus::Saved,
        }
    }

    fn snapshot(avg: i64, safety: i64) -> ForecastSnapshot {
        ForecastSnapshot {
            average_daily_outflow: Decimal::from(avg),
            days_remaining: None,
            safety_stock: Decimal::from(safety),
            dead_stock: Decimal::from(5),
            predicted_critical_date: None,
        }
    }

    #[test]
    fn test_prognosis_continues_from_last_closing() {
        let rows = vec![row(1, 10, 30), row(2, 10, 20)];
        let series = build_chart(&rows, &snapshot(10, 6));

        assert_eq!(series.labels.len(), 4);
        assert_eq!(series.closing[1], Some(Decimal::from(20)));
        // Prognosis joins the closing line on the last reported day.
        assert_eq!(series.prognosis[1], Some(Decimal::from(20)));
        assert_eq!(series.prognosis[2], Some(Decimal::from(10)));
        assert_eq!(series.prognosis[3], Some(Decimal::ZERO));
        assert_eq!(series.labels[3], "2024-06-04");
    }

    #[test]
    fn test_below_safety_flags() {
        let rows = vec![row(1, 10, 30), row(2, 10, 20)];
        let series = build_chart(&rows, &snapshot(10, 12));

        assert_eq!(series.below_safety, vec![false, false, true, true]);
    }

    #[test]
    fn test_no_projection_without_outflow_average() {
        let rows = vec![row(1, 0, 30)];
        let series = build_chart(&rows, &snapshot(0, 6));

        assert_eq!(series.labels.len(), 1);
        assert_eq!(series.prognosis, vec![None]);
    }

    #[test]
    fn test_unreported_rows_excluded() {
        let mut rows = vec![row(1, 10, 30)];
        rows.push(DailyStockRow::empty(
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            Decimal::from(5),
        ));
        let series = build_chart(&rows, &snapshot(0, 6));

        assert_eq!(series.labels, vec!["2024-06-01".to_string()]);
    }
}
