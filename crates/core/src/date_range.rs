//! Inclusive calendar date ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Inclusive `[start, end]` range of business dates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl ValueObject for DateRange {}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if end < start {
            return Err(DomainError::validation(format!(
                "date range end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Two inclusive ranges overlap when they share at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of days covered (inclusive).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl core::fmt::Display for DateRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(DateRange::new(d(2024, 3, 2), d(2024, 3, 1)).is_err());
    }

    #[test]
    fn bounds_are_inclusive() {
        let r = DateRange::new(d(2024, 3, 1), d(2024, 3, 10)).unwrap();
        assert!(r.contains(d(2024, 3, 1)));
        assert!(r.contains(d(2024, 3, 10)));
        assert!(!r.contains(d(2024, 3, 11)));
        assert_eq!(r.days(), 10);
    }

    #[test]
    fn touching_ranges_overlap_adjacent_do_not() {
        let a = DateRange::new(d(2024, 3, 1), d(2024, 3, 10)).unwrap();
        let b = DateRange::new(d(2024, 3, 10), d(2024, 3, 20)).unwrap();
        let c = DateRange::new(d(2024, 3, 11), d(2024, 3, 20)).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
