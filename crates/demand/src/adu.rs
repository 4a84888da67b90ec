//! Average Daily Usage with demand adjustment factors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ddmrp_core::{DateRange, DomainError, DomainResult, ProductLocationPair, ValueObject};

use crate::sales::{HistoricalSalesRecord, SalesWindow, ensure_window_days};

/// Allowed DAF multiplier bounds (inclusive).
pub const DAF_MIN: f64 = 0.2;
pub const DAF_MAX: f64 = 3.0;

/// Default ADU window (days).
pub const DEFAULT_ADU_WINDOW_DAYS: u32 = 90;

/// Date-ranged multiplier applied to ADU for known promotional/seasonal effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandAdjustmentFactor {
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daf: f64,
}

impl DemandAdjustmentFactor {
    pub fn range(&self) -> DomainResult<DateRange> {
        DateRange::new(self.start_date, self.end_date)
    }

    fn validate(&self) -> DomainResult<DateRange> {
        if !self.daf.is_finite() || !(DAF_MIN..=DAF_MAX).contains(&self.daf) {
            return Err(DomainError::invalid_config(format!(
                "daf for {} must be within [{DAF_MIN}, {DAF_MAX}] (got {})",
                self.pair, self.daf
            )));
        }
        self.range()
    }
}

/// Write-validated DAF entries.
///
/// Overlapping ranges for the same pair are rejected when written, so a read
/// never has to choose between two applicable factors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DafSchedule {
    entries: BTreeMap<ProductLocationPair, Vec<(DateRange, f64)>>,
}

impl DafSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = DemandAdjustmentFactor>,
    ) -> DomainResult<Self> {
        let mut schedule = Self::new();
        for entry in entries {
            schedule.insert(entry)?;
        }
        Ok(schedule)
    }

    pub fn insert(&mut self, entry: DemandAdjustmentFactor) -> DomainResult<()> {
        let range = entry.validate()?;
        let ranges = self.entries.entry(entry.pair.clone()).or_default();
        if let Some((existing, _)) = ranges.iter().find(|(r, _)| r.overlaps(&range)) {
            return Err(DomainError::invalid_config(format!(
                "daf range {range} for {} overlaps existing range {existing}",
                entry.pair
            )));
        }
        ranges.push((range, entry.daf));
        ranges.sort_by_key(|(r, _)| r.start());
        Ok(())
    }

    /// The factor active for `pair` on `date`, 1.0 when none applies.
    pub fn factor_on(&self, pair: &ProductLocationPair, date: NaiveDate) -> f64 {
        self.entries
            .get(pair)
            .and_then(|ranges| ranges.iter().find(|(r, _)| r.contains(date)))
            .map(|(_, daf)| *daf)
            .unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// ADU estimate for one pair at one evaluation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AduEstimate {
    pub window_days: u32,
    pub sample_count: usize,
    pub adu_raw: f64,
    pub daf: f64,
    pub adu_adjusted: f64,
}

impl ValueObject for AduEstimate {}

/// Computes ADU over a trailing window of `window_days`.
///
/// `adu_raw = sum(quantities in window) / window_days`: days without sales
/// count as zero demand.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AduEstimator {
    window_days: u32,
}

impl Default for AduEstimator {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_ADU_WINDOW_DAYS,
        }
    }
}

impl AduEstimator {
    pub fn new(window_days: u32) -> DomainResult<Self> {
        let window_days = ensure_window_days("adu window", window_days)?;
        Ok(Self { window_days })
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn estimate<'a>(
        &self,
        pair: &ProductLocationPair,
        records: impl IntoIterator<Item = &'a HistoricalSalesRecord>,
        evaluation_date: NaiveDate,
        schedule: &DafSchedule,
    ) -> DomainResult<AduEstimate> {
        let window = SalesWindow::ending_on(evaluation_date, self.window_days);
        let quantities = window.quantities(pair, records)?;
        let daf = schedule.factor_on(pair, evaluation_date);
        Ok(self.estimate_from(&quantities, daf))
    }

    /// ADU from already-windowed quantities and an applicable DAF.
    pub fn estimate_from(&self, quantities: &[f64], daf: f64) -> AduEstimate {
        let adu_raw = quantities.iter().sum::<f64>() / f64::from(self.window_days);
        AduEstimate {
            window_days: self.window_days,
            sample_count: quantities.len(),
            adu_raw,
            daf,
            adu_adjusted: adu_raw * daf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn pair() -> ProductLocationPair {
        ProductLocationPair::parse("SKU-1", "DC-1").unwrap()
    }

    fn daf(start: NaiveDate, end: NaiveDate, value: f64) -> DemandAdjustmentFactor {
        DemandAdjustmentFactor {
            pair: pair(),
            start_date: start,
            end_date: end,
            daf: value,
        }
    }

    #[test]
    fn default_factor_is_one() {
        let schedule = DafSchedule::new();
        assert_eq!(schedule.factor_on(&pair(), d(6, 1)), 1.0);
    }

    #[test]
    fn factor_applies_only_inside_its_range() {
        let schedule = DafSchedule::from_entries([daf(d(6, 1), d(6, 30), 1.5)]).unwrap();
        assert_eq!(schedule.factor_on(&pair(), d(6, 15)), 1.5);
        assert_eq!(schedule.factor_on(&pair(), d(7, 1)), 1.0);
    }

    #[test]
    fn overlapping_ranges_are_rejected_at_write_time() {
        let mut schedule = DafSchedule::new();
        schedule.insert(daf(d(6, 1), d(6, 30), 1.5)).unwrap();
        let err = schedule.insert(daf(d(6, 30), d(7, 15), 0.8)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfiguration(_)));
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn out_of_bounds_daf_is_rejected() {
        let mut schedule = DafSchedule::new();
        assert!(schedule.insert(daf(d(6, 1), d(6, 2), 0.1)).is_err());
        assert!(schedule.insert(daf(d(6, 1), d(6, 2), 3.5)).is_err());
        assert!(schedule.insert(daf(d(6, 1), d(6, 2), 3.0)).is_ok());
    }

    #[test]
    fn adu_divides_by_window_days_and_applies_daf() {
        let records: Vec<HistoricalSalesRecord> = (1..=10)
            .map(|day| HistoricalSalesRecord {
                pair: pair(),
                sales_date: d(6, day),
                quantity_sold: 9.0,
            })
            .collect();
        let schedule = DafSchedule::from_entries([daf(d(6, 1), d(6, 30), 2.0)]).unwrap();
        let estimator = AduEstimator::new(30).unwrap();
        let est = estimator.estimate(&pair(), &records, d(6, 10), &schedule).unwrap();
        assert_eq!(est.sample_count, 10);
        assert!((est.adu_raw - 3.0).abs() < 1e-12);
        assert_eq!(est.daf, 2.0);
        assert!((est.adu_adjusted - 6.0).abs() < 1e-12);
    }

    #[test]
    fn zero_window_is_invalid() {
        assert!(AduEstimator::new(0).is_err());
        assert!(AduEstimator::new(u32::MAX).is_err());
    }
}
