use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use ddmrp_core::{DomainError, DomainResult, ProductLocationPair};

/// One day of sales for a pair. Append-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSalesRecord {
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    pub sales_date: NaiveDate,
    pub quantity_sold: f64,
}

impl HistoricalSalesRecord {
    pub fn validate(&self) -> DomainResult<()> {
        if !self.quantity_sold.is_finite() || self.quantity_sold < 0.0 {
            return Err(DomainError::validation(format!(
                "quantity_sold must be a non-negative number for {} on {} (got {})",
                self.pair, self.sales_date, self.quantity_sold
            )));
        }
        Ok(())
    }
}

/// Longest sales window any analysis accepts (about ten years).
pub const MAX_WINDOW_DAYS: u32 = 3_660;

/// Reject window lengths outside `1..=MAX_WINDOW_DAYS`.
pub fn ensure_window_days(field: &str, days: u32) -> DomainResult<u32> {
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(DomainError::invalid_config(format!(
            "{field} must be between 1 and {MAX_WINDOW_DAYS} days (got {days})"
        )));
    }
    Ok(days)
}

/// A sliding read over sales history: `(end - days, end]`.
///
/// The window never mutates the underlying records; it selects and orders.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SalesWindow {
    end: NaiveDate,
    days: u32,
}

impl SalesWindow {
    pub fn ending_on(end: NaiveDate, days: u32) -> Self {
        Self { end, days }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// First date included in the window, clamped to the earliest
    /// representable date.
    pub fn start(&self) -> NaiveDate {
        match self.days {
            0 => self.end.succ_opt().unwrap_or(self.end),
            n => self
                .end
                .checked_sub_days(Days::new(u64::from(n - 1)))
                .unwrap_or(NaiveDate::MIN),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days > 0 && self.start() <= date && date <= self.end
    }

    /// Records of `pair` inside the window, ordered by date.
    ///
    /// Invalid records are rejected rather than silently skipped.
    pub fn select<'a>(
        &self,
        pair: &ProductLocationPair,
        records: impl IntoIterator<Item = &'a HistoricalSalesRecord>,
    ) -> DomainResult<Vec<&'a HistoricalSalesRecord>> {
        let mut selected = Vec::new();
        for record in records {
            if &record.pair != pair || !self.contains(record.sales_date) {
                continue;
            }
            record.validate()?;
            selected.push(record);
        }
        selected.sort_by_key(|r| r.sales_date);
        Ok(selected)
    }

    /// Quantities of `pair` inside the window, ordered by date.
    pub fn quantities<'a>(
        &self,
        pair: &ProductLocationPair,
        records: impl IntoIterator<Item = &'a HistoricalSalesRecord>,
    ) -> DomainResult<Vec<f64>> {
        Ok(self
            .select(pair, records)?
            .into_iter()
            .map(|r| r.quantity_sold)
            .collect())
    }

    /// Dense daily series for `pair`: one value per window day, zero for days
    /// without sales, multiple records on the same day summed.
    pub fn daily_series<'a>(
        &self,
        pair: &ProductLocationPair,
        records: impl IntoIterator<Item = &'a HistoricalSalesRecord>,
    ) -> DomainResult<Vec<f64>> {
        let mut series = vec![0.0; ensure_window_days("sales window", self.days)? as usize];
        let start = self.start();
        for record in self.select(pair, records)? {
            let offset = (record.sales_date - start).num_days() as usize;
            series[offset] += record.quantity_sold;
        }
        Ok(series)
    }
}

/// Group an unordered feed by pair (deterministic ordering).
pub fn group_by_pair(
    records: &[HistoricalSalesRecord],
) -> BTreeMap<ProductLocationPair, Vec<&HistoricalSalesRecord>> {
    let mut grouped: BTreeMap<ProductLocationPair, Vec<&HistoricalSalesRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.pair.clone()).or_default().push(record);
    }
    for rows in grouped.values_mut() {
        rows.sort_by_key(|r| r.sales_date);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn pair(p: &str) -> ProductLocationPair {
        ProductLocationPair::parse(p, "LOC-1").unwrap()
    }

    fn rec(p: &str, day: u32, qty: f64) -> HistoricalSalesRecord {
        HistoricalSalesRecord {
            pair: pair(p),
            sales_date: d(day),
            quantity_sold: qty,
        }
    }

    #[test]
    fn window_includes_end_and_excludes_day_before_start() {
        let window = SalesWindow::ending_on(d(10), 5);
        assert_eq!(window.start(), d(6));
        assert!(window.contains(d(10)));
        assert!(window.contains(d(6)));
        assert!(!window.contains(d(5)));
        assert!(!window.contains(d(11)));
    }

    #[test]
    fn select_filters_pair_and_orders_by_date() {
        let records = vec![rec("A", 9, 3.0), rec("B", 8, 7.0), rec("A", 7, 1.0), rec("A", 1, 9.0)];
        let window = SalesWindow::ending_on(d(10), 5);
        let qty = window.quantities(&pair("A"), &records).unwrap();
        assert_eq!(qty, vec![1.0, 3.0]);
    }

    #[test]
    fn daily_series_fills_missing_days_with_zero() {
        let records = vec![rec("A", 10, 4.0), rec("A", 8, 2.0), rec("A", 8, 1.0)];
        let window = SalesWindow::ending_on(d(10), 3);
        let series = window.daily_series(&pair("A"), &records).unwrap();
        assert_eq!(series, vec![3.0, 0.0, 4.0]);
    }

    #[test]
    fn oversized_window_never_panics() {
        let records = vec![rec("A", 9, 2.0)];
        let window = SalesWindow::ending_on(d(10), u32::MAX);
        assert_eq!(window.start(), NaiveDate::MIN);
        assert!(window.contains(d(1)));
        assert_eq!(window.quantities(&pair("A"), &records).unwrap(), vec![2.0]);

        let err = window.daily_series(&pair("A"), &records).unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfiguration(_)));
    }

    #[test]
    fn window_days_are_bounded() {
        assert!(ensure_window_days("lookback", 0).is_err());
        assert_eq!(ensure_window_days("lookback", MAX_WINDOW_DAYS).unwrap(), MAX_WINDOW_DAYS);
        assert!(ensure_window_days("lookback", MAX_WINDOW_DAYS + 1).is_err());
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let records = vec![rec("A", 9, -1.0)];
        let window = SalesWindow::ending_on(d(10), 5);
        assert!(window.quantities(&pair("A"), &records).is_err());
    }

    #[test]
    fn group_by_pair_is_sorted() {
        let records = vec![rec("B", 2, 1.0), rec("A", 3, 1.0), rec("A", 1, 1.0)];
        let grouped = group_by_pair(&records);
        let keys: Vec<_> = grouped.keys().map(|k| k.product_id.to_string()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(grouped[&pair("A")][0].sales_date, d(1));
    }
}
