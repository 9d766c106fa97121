//! The `(month, year)` unit of calculation and storage.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{ComputeError, Result};

/// A calendar month, stored as its first day so ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    first_day: NaiveDate,
}

impl Period {
    /// Builds a period, rejecting months outside 1..=12.
    pub fn new(month: u32, year: i32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or(ComputeError::InvalidPeriod {
                month: month.into(),
                year: year.into(),
            })
    }

    /// Builds a period from the signed integer columns used in storage and
    /// in request paths.
    pub fn from_db(month: i32, year: i32) -> Result<Self> {
        let month = u32::try_from(month).map_err(|_| ComputeError::InvalidPeriod {
            month: month.into(),
            year: year.into(),
        })?;
        Self::new(month, year)
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// Month as stored in the `month` column.
    pub fn db_month(&self) -> i32 {
        self.first_day.month() as i32
    }

    /// The immediately preceding calendar month; January rolls over to
    /// December of the prior year.
    pub fn previous(&self) -> Option<Period> {
        self.first_day
            .pred_opt()
            .and_then(|last_day| last_day.with_day(1))
            .map(|first_day| Period { first_day })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month(), self.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_months() {
        assert!(Period::new(0, 2025).is_err());
        assert!(Period::new(13, 2025).is_err());
        assert!(Period::from_db(-1, 2025).is_err());
        assert!(Period::new(12, 2025).is_ok());
    }

    #[test]
    fn test_previous_rolls_over_january() {
        let january = Period::new(1, 2025).unwrap();
        assert_eq!(january.previous(), Some(Period::new(12, 2024).unwrap()));

        let july = Period::new(7, 2025).unwrap();
        assert_eq!(july.previous(), Some(Period::new(6, 2025).unwrap()));
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec = Period::new(12, 2024).unwrap();
        let jan = Period::new(1, 2025).unwrap();
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "01/2025");
    }
}
