//! Bullwhip (demand amplification) analysis.
//!
//! `ratio = order CV / customer demand CV`. A ratio above 1 means orders
//! placed upstream vary more than the demand they serve.

use serde::{Deserialize, Serialize};

use crate::statistics::DemandStatistics;

/// A replenishment order placed upstream for a pair (quantity only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_date: chrono::NaiveDate,
    pub ordered_qty: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BullwhipSeverity {
    Critical,
    High,
    Moderate,
    Mild,
    Minimal,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BullwhipAnalysis {
    pub ratio: f64,
    pub demand_cv: f64,
    pub order_cv: f64,
    pub score: f64,
    pub severity: BullwhipSeverity,
    /// `false` when either series was too short; ratio/score are neutral defaults then.
    pub sufficient_data: bool,
}

impl BullwhipAnalysis {
    /// Neutral result used when demand or order history is missing.
    pub fn neutral() -> Self {
        Self {
            ratio: 1.0,
            demand_cv: 0.0,
            order_cv: 0.0,
            score: 50.0,
            severity: BullwhipSeverity::Minimal,
            sufficient_data: false,
        }
    }

    pub fn analyze(demand: &[f64], orders: &[f64]) -> Self {
        let demand_stats = DemandStatistics::compute(demand);
        let order_stats = DemandStatistics::compute(orders);
        if !demand_stats.is_sufficient() || !order_stats.is_sufficient() {
            return Self::neutral();
        }

        let ratio = if demand_stats.cv > 0.0 {
            order_stats.cv / demand_stats.cv
        } else {
            1.0
        };
        let (score, severity) = score_ratio(ratio);

        Self {
            ratio,
            demand_cv: demand_stats.cv,
            order_cv: order_stats.cv,
            score,
            severity,
            sufficient_data: true,
        }
    }
}

fn score_ratio(ratio: f64) -> (f64, BullwhipSeverity) {
    if ratio >= 3.0 {
        (100.0, BullwhipSeverity::Critical)
    } else if ratio >= 2.0 {
        (85.0, BullwhipSeverity::High)
    } else if ratio >= 1.5 {
        (70.0, BullwhipSeverity::Moderate)
    } else if ratio >= 1.2 {
        (50.0, BullwhipSeverity::Mild)
    } else if ratio >= 1.0 {
        (30.0, BullwhipSeverity::Minimal)
    } else {
        (20.0, BullwhipSeverity::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_orders_give_neutral_score() {
        let a = BullwhipAnalysis::analyze(&[10.0, 12.0, 8.0], &[]);
        assert!(!a.sufficient_data);
        assert_eq!(a.ratio, 1.0);
        assert_eq!(a.score, 50.0);
    }

    #[test]
    fn amplified_orders_score_high() {
        // demand cv = 0.1, order cv = 0.5 → ratio 5
        let demand = [9.0, 11.0];
        let orders = [50.0, 150.0];
        let a = BullwhipAnalysis::analyze(&demand, &orders);
        assert!(a.sufficient_data);
        assert!((a.ratio - 5.0).abs() < 1e-9);
        assert_eq!(a.score, 100.0);
        assert_eq!(a.severity, BullwhipSeverity::Critical);
    }

    #[test]
    fn flat_demand_yields_unit_ratio() {
        let a = BullwhipAnalysis::analyze(&[10.0, 10.0], &[5.0, 15.0]);
        assert_eq!(a.ratio, 1.0);
        assert_eq!(a.score, 30.0);
    }

    #[test]
    fn smoothing_orders_score_low() {
        let a = BullwhipAnalysis::analyze(&[5.0, 15.0], &[9.0, 11.0]);
        assert!(a.ratio < 1.0);
        assert_eq!(a.severity, BullwhipSeverity::None);
        assert_eq!(a.score, 20.0);
    }
}
