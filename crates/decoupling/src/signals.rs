//! Raw planning signals to normalised factor scores.

use serde::{Deserialize, Serialize};

use crate::factors::{Factor, FactorValues};
use crate::scorer::ScoringMode;

pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, 100.0) } else { 0.0 }
}

/// Longer lead times favour decoupling.
pub fn lead_time_score(lead_time_days: f64) -> f64 {
    if lead_time_days <= 1.0 {
        20.0
    } else if lead_time_days <= 3.0 {
        35.0
    } else if lead_time_days <= 7.0 {
        50.0
    } else if lead_time_days <= 14.0 {
        70.0
    } else {
        90.0
    }
}

/// Days of demand covered by one minimum order.
pub fn moq_coverage_days(moq: f64, adu: f64) -> f64 {
    if moq <= 0.0 {
        0.0
    } else if adu <= 0.0 {
        f64::INFINITY
    } else {
        moq / adu
    }
}

pub fn moq_rigidity_score(coverage_days: f64) -> f64 {
    if coverage_days >= 14.0 {
        90.0
    } else if coverage_days >= 7.0 {
        70.0
    } else if coverage_days >= 3.0 {
        50.0
    } else {
        20.0
    }
}

/// Business criticality from core-item status and sales share (percent).
pub fn criticality_score(is_core_item: bool, sales_share_pct: f64) -> f64 {
    match (is_core_item, sales_share_pct > 50.0) {
        (true, true) => 90.0,
        (true, false) => 80.0,
        (false, true) => 70.0,
        (false, false) => 30.0,
    }
}

/// Poor on-time-in-full delivery and single sourcing push the score up.
///
/// Unknown OTIF counts as neutral (50 before the sourcing adjustment).
pub fn supplier_reliability_score(otif_pct: Option<f64>, supplier_count: Option<u32>) -> f64 {
    let base = match otif_pct {
        Some(otif) if otif >= 95.0 => 20.0,
        Some(otif) if otif >= 90.0 => 40.0,
        Some(otif) if otif >= 80.0 => 60.0,
        Some(_) => 80.0,
        None => 50.0,
    };
    let sourcing = match supplier_count {
        Some(0 | 1) => 10.0,
        Some(n) if n >= 3 => -10.0,
        _ => 0.0,
    };
    clamp_score(base + sourcing)
}

/// Share of parent BOMs that use the item, as a score.
pub fn component_criticality_score(parents_using: u32, total_parents: u32) -> f64 {
    if total_parents == 0 {
        return 0.0;
    }
    clamp_score(f64::from(parents_using) / f64::from(total_parents) * 100.0)
}

/// Raw signals for one pair. Absent signals leave their factor out of the
/// table, which the scorer reports as insufficient data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorSignals {
    pub variability_score: Option<f64>,
    pub volume_score: Option<f64>,
    pub bullwhip_score: Option<f64>,
    pub lead_time_days: Option<f64>,
    pub moq: Option<f64>,
    pub adu: Option<f64>,
    pub is_core_item: bool,
    pub sales_share_pct: f64,
    pub supplier_otif_pct: Option<f64>,
    pub supplier_count: Option<u32>,
    pub holding_cost: Option<f64>,
    pub storage_intensity: Option<f64>,
    pub bom_parents_using: Option<u32>,
    pub bom_total_parents: Option<u32>,
}

impl FactorSignals {
    pub fn has_component_data(&self) -> bool {
        self.bom_total_parents.is_some_and(|n| n > 0)
    }

    pub fn to_values(&self, mode: ScoringMode) -> FactorValues {
        let mut values = FactorValues::new();
        let mut put = |factor: Factor, value: Option<f64>| {
            if let Some(v) = value {
                values.set(factor, v);
            }
        };

        put(Factor::Variability, self.variability_score.map(clamp_score));
        put(Factor::Volume, self.volume_score.map(clamp_score));
        put(Factor::Bullwhip, self.bullwhip_score.map(clamp_score));
        put(Factor::LeadTime, self.lead_time_days.map(lead_time_score));
        put(
            Factor::MoqRigidity,
            Some(moq_rigidity_score(moq_coverage_days(
                self.moq.unwrap_or(0.0),
                self.adu.unwrap_or(0.0),
            ))),
        );
        put(
            Factor::Criticality,
            Some(criticality_score(self.is_core_item, self.sales_share_pct)),
        );
        put(
            Factor::SupplierReliability,
            Some(supplier_reliability_score(self.supplier_otif_pct, self.supplier_count)),
        );
        put(Factor::HoldingCost, self.holding_cost.map(clamp_score));
        put(Factor::StorageIntensity, self.storage_intensity.map(clamp_score));

        if mode == ScoringMode::ComponentAware {
            put(
                Factor::ComponentCriticality,
                self.bom_total_parents.map(|total| {
                    component_criticality_score(self.bom_parents_using.unwrap_or(0), total)
                }),
            );
        }
        values
    }
}
