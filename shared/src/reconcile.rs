//! Daily balance reconciliation
//!
//! Derives the goods-received quantity for every row of a period from
//! the chain of daily closing balances. The engine is a pure function of
//! the current row values plus the prior period's closing balance, so
//! re-running it without edits is a no-op.

use rust_decimal::Decimal;

use crate::models::DailyStockRow;

/// Derive `quantity_received` for each row in date order.
///
/// For row 0 the previous closing balance is `prior_closing` (the last
/// balance of the previous period, or an externally supplied opening
/// balance, or zero). For row i > 0 it is row i-1's `quantity_end`,
/// treated as zero when unset.
///
/// A row with an unset `quantity_out`, or an unset or zero
/// `quantity_end`, derives to zero: a zero closing balance is read as
/// "not yet reported", not as a real empty silo. Field exports arrive
/// zero-filled for unreported days, which is what this guards against;
/// the cost is that a day that genuinely ended empty also derives zero.
///
/// Otherwise `received = end - (prev_end - out)`. The result is not
/// clamped; a negative value is a visible data-quality signal.
pub fn derive_received(rows: &[DailyStockRow], prior_closing: Decimal) -> Vec<Decimal> {
    let mut prev_end = prior_closing;
    let mut derived = Vec::with_capacity(rows.len());

    for row in rows {
        let received = match (row.quantity_end, row.quantity_out) {
            (Some(end), Some(out)) if end != Decimal::ZERO => end - (prev_end - out),
            _ => Decimal::ZERO,
        };
        derived.push(received);
        prev_end = row.quantity_end.unwrap_or(Decimal::ZERO);
    }

    derived
}

/// Life stock is the usable portion of the closing balance. Not clamped:
/// a negative value means the area has dipped into dead stock.
pub fn life_stock(quantity_end: Option<Decimal>, dead_stock: Decimal) -> Decimal {
    quantity_end.unwrap_or(Decimal::ZERO) - dead_stock
}

/// Write the derived columns back onto the rows, returning `true` when
/// any value changed. The caller uses the change flag to decide whether
/// a batch save is needed.
pub fn apply_derivation(rows: &mut [DailyStockRow], prior_closing: Decimal) -> bool {
    let derived = derive_received(rows, prior_closing);
    let mut changed = false;

    for (row, received) in rows.iter_mut().zip(derived) {
        let life = life_stock(row.quantity_end, row.dead_stock);
        if row.quantity_received != received || row.life_stock != life {
            row.quantity_received = received;
            row.life_stock = life;
            changed = true;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyStockRow;
    use chrono::NaiveDate;

    fn row(day: u32, out: Option<i64>, end: Option<i64>) -> DailyStockRow {
        let mut r = DailyStockRow::empty(
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            Decimal::ZERO,
        );
        r.quantity_out = out.map(Decimal::from);
        r.quantity_end = end.map(Decimal::from);
        r
    }

    #[test]
    fn chain_without_prior_balance() {
        // end 100 / out 0, then end 90 / out 10
        let rows = vec![row(1, Some(0), Some(100)), row(2, Some(10), Some(90))];
        let derived = derive_received(&rows, Decimal::ZERO);
        assert_eq!(derived[0], Decimal::from(100)); // 100 - (0 - 0)
        assert_eq!(derived[1], Decimal::ZERO); // 90 - (100 - 10)
    }

    #[test]
    fn chain_with_prior_closing_balance() {
        let rows = vec![row(1, Some(20), Some(130))];
        let derived = derive_received(&rows, Decimal::from(100));
        // 130 - (100 - 20) = 50 received on day 1
        assert_eq!(derived[0], Decimal::from(50));
    }

    #[test]
    fn zero_closing_balance_suppresses_derivation() {
        let rows = vec![row(1, Some(5), Some(0))];
        let derived = derive_received(&rows, Decimal::from(500));
        assert_eq!(derived[0], Decimal::ZERO);
    }

    #[test]
    fn unset_out_suppresses_derivation() {
        let rows = vec![row(1, None, Some(80))];
        assert_eq!(derive_received(&rows, Decimal::ZERO)[0], Decimal::ZERO);
    }

    #[test]
    fn negative_received_is_not_clamped() {
        // closing balance dropped by more than was taken out
        let rows = vec![row(1, Some(10), Some(50))];
        let derived = derive_received(&rows, Decimal::from(100));
        assert_eq!(derived[0], Decimal::from(-40));
    }

    #[test]
    fn unset_end_breaks_chain_as_zero() {
        let rows = vec![row(1, None, None), row(2, Some(10), Some(90))];
        let derived = derive_received(&rows, Decimal::from(100));
        assert_eq!(derived[0], Decimal::ZERO);
        // prev_end for day 2 is day 1's unset end, treated as 0
        assert_eq!(derived[1], Decimal::from(100)); // 90 - (0 - 10)
    }

    #[test]
    fn life_stock_may_go_negative() {
        assert_eq!(
            life_stock(Some(Decimal::from(30)), Decimal::from(50)),
            Decimal::from(-20)
        );
        assert_eq!(life_stock(None, Decimal::from(50)), Decimal::from(-50));
    }

    #[test]
    fn apply_derivation_is_idempotent() {
        let mut rows = vec![
            row(1, Some(0), Some(100)),
            row(2, Some(10), Some(90)),
            row(3, Some(25), Some(110)),
        ];
        let prior = Decimal::from(40);
        let first = apply_derivation(&mut rows, prior);
        assert!(first);
        let snapshot: Vec<_> = rows.iter().map(|r| r.quantity_received).collect();
        let second = apply_derivation(&mut rows, prior);
        assert!(!second);
        let again: Vec<_> = rows.iter().map(|r| r.quantity_received).collect();
        assert_eq!(snapshot, again);
    }
}
