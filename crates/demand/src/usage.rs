//! Usage share and volume scoring.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ddmrp_core::{DomainResult, LocationId, ProductLocationPair};

use crate::sales::{HistoricalSalesRecord, SalesWindow};

/// Usage of one pair relative to its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAnalysis {
    pub pair: ProductLocationPair,
    pub total_qty: f64,
    pub avg_weekly_usage: f64,
    /// Share of the location's total usage in the window, in percent.
    pub percentage_of_total_usage: f64,
    pub volume_score: f64,
}

/// Volume score from a usage share in percent.
pub fn volume_score(percentage: f64) -> f64 {
    if percentage >= 20.0 {
        90.0
    } else if percentage >= 10.0 {
        70.0
    } else if percentage >= 5.0 {
        50.0
    } else {
        20.0
    }
}

/// Compute usage analysis for every pair with sales inside `window`.
pub fn analyze_usage(
    records: &[HistoricalSalesRecord],
    window: SalesWindow,
) -> DomainResult<Vec<UsageAnalysis>> {
    let mut per_pair: BTreeMap<ProductLocationPair, f64> = BTreeMap::new();
    let mut per_location: BTreeMap<LocationId, f64> = BTreeMap::new();

    for record in records.iter().filter(|r| window.contains(r.sales_date)) {
        record.validate()?;
        *per_pair.entry(record.pair.clone()).or_default() += record.quantity_sold;
        *per_location.entry(record.pair.location_id.clone()).or_default() += record.quantity_sold;
    }

    let weeks = f64::from(window.days()) / 7.0;

    Ok(per_pair
        .into_iter()
        .map(|(pair, total_qty)| {
            let location_total = per_location.get(&pair.location_id).copied().unwrap_or(0.0);
            let percentage = if location_total > 0.0 {
                total_qty / location_total * 100.0
            } else {
                0.0
            };
            UsageAnalysis {
                avg_weekly_usage: if weeks > 0.0 { total_qty / weeks } else { 0.0 },
                percentage_of_total_usage: percentage,
                volume_score: volume_score(percentage),
                total_qty,
                pair,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(p: &str, loc: &str, qty: f64) -> HistoricalSalesRecord {
        HistoricalSalesRecord {
            pair: ProductLocationPair::parse(p, loc).unwrap(),
            sales_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            quantity_sold: qty,
        }
    }

    #[test]
    fn volume_score_thresholds() {
        assert_eq!(volume_score(25.0), 90.0);
        assert_eq!(volume_score(20.0), 90.0);
        assert_eq!(volume_score(12.0), 70.0);
        assert_eq!(volume_score(5.0), 50.0);
        assert_eq!(volume_score(4.9), 20.0);
    }

    #[test]
    fn shares_are_relative_to_the_location() {
        let records = vec![
            rec("A", "L1", 30.0),
            rec("B", "L1", 70.0),
            rec("C", "L2", 5.0),
        ];
        let window = SalesWindow::ending_on(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), 28);
        let usage = analyze_usage(&records, window).unwrap();
        assert_eq!(usage.len(), 3);
        let a = usage.iter().find(|u| u.pair.product_id.as_str() == "A").unwrap();
        assert!((a.percentage_of_total_usage - 30.0).abs() < 1e-9);
        assert_eq!(a.volume_score, 90.0);
        assert!((a.avg_weekly_usage - 7.5).abs() < 1e-9);
        let c = usage.iter().find(|u| u.pair.product_id.as_str() == "C").unwrap();
        assert!((c.percentage_of_total_usage - 100.0).abs() < 1e-9);
    }
}
