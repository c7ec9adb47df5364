//! Common types used across the ledger

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifies one ledger period: one storage area for one calendar month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub plant_id: i32,
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    pub fn new(plant_id: i32, year: i32, month: u32) -> Self {
        Self {
            plant_id,
            year,
            month,
        }
    }

    /// First calendar day of the period.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Last calendar day of the period.
    pub fn last_day(&self) -> Option<NaiveDate> {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.map(|d| d - Duration::days(1))
    }

    /// Every calendar day of the period, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        match (self.first_day(), self.last_day()) {
            (Some(first), Some(last)) => first.iter_days().take_while(|d| *d <= last).collect(),
            _ => Vec::new(),
        }
    }

    /// The period immediately before this one.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self::new(self.plant_id, self.year - 1, 12)
        } else {
            Self::new(self.plant_id, self.year, self.month - 1)
        }
    }

    /// Whether a date falls inside this period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "plant {} {:04}-{:02}", self.plant_id, self.year, self.month)
    }
}

/// Date range for queries and export metadata
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_days_cover_whole_month() {
        let key = PeriodKey::new(1, 2024, 2);
        let days = key.days();
        assert_eq!(days.len(), 29); // leap year
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(days[28], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn previous_period_wraps_year() {
        let key = PeriodKey::new(3, 2024, 1);
        assert_eq!(key.previous(), PeriodKey::new(3, 2023, 12));
    }

    #[test]
    fn december_last_day() {
        let key = PeriodKey::new(1, 2023, 12);
        assert_eq!(
            key.last_day(),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
    }
}
