//! JSON planning snapshot: every input feed the engine consumes, in one document.

use chrono::NaiveDate;
use ddmrp_buffer::{BufferProfile, CustomerOrder, OpenPurchaseOrder};
use ddmrp_core::ProductLocationPair;
use ddmrp_decoupling::DecouplingPoint;
use ddmrp_demand::{DemandAdjustmentFactor, HistoricalSalesRecord, OrderRecord};
use serde::{Deserialize, Serialize};

/// Upstream replenishment order, used for bullwhip analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentOrderRow {
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    #[serde(flatten)]
    pub order: OrderRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnHandRow {
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    pub on_hand: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTimeRow {
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    pub dlt_days: f64,
}

/// Item master attributes feeding the non-demand scoring factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAttributesRow {
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    #[serde(default)]
    pub is_core_item: bool,
    #[serde(default)]
    pub moq: Option<f64>,
    #[serde(default)]
    pub supplier_otif_pct: Option<f64>,
    #[serde(default)]
    pub supplier_count: Option<u32>,
    #[serde(default)]
    pub holding_cost_score: Option<f64>,
    #[serde(default)]
    pub storage_intensity_score: Option<f64>,
    #[serde(default)]
    pub bom_parents_using: Option<u32>,
    #[serde(default)]
    pub bom_total_parents: Option<u32>,
    /// Profile from the item master, bound on designation.
    #[serde(default)]
    pub buffer_profile_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningSnapshot {
    pub evaluation_date: NaiveDate,
    #[serde(default)]
    pub sales: Vec<HistoricalSalesRecord>,
    #[serde(default)]
    pub replenishment_orders: Vec<ReplenishmentOrderRow>,
    #[serde(default)]
    pub purchase_orders: Vec<OpenPurchaseOrder>,
    #[serde(default)]
    pub customer_orders: Vec<CustomerOrder>,
    #[serde(default)]
    pub on_hand: Vec<OnHandRow>,
    #[serde(default)]
    pub lead_times: Vec<LeadTimeRow>,
    #[serde(default)]
    pub demand_adjustments: Vec<DemandAdjustmentFactor>,
    #[serde(default)]
    pub buffer_profiles: Vec<BufferProfile>,
    #[serde(default)]
    pub items: Vec<ItemAttributesRow>,
    #[serde(default)]
    pub decoupling_points: Vec<DecouplingPoint>,
    /// Pairs to consider for designation; every pair with sales when absent.
    #[serde(default)]
    pub candidates: Option<Vec<ProductLocationPair>>,
}

impl PlanningSnapshot {
    pub fn empty(evaluation_date: NaiveDate) -> Self {
        Self {
            evaluation_date,
            sales: Vec::new(),
            replenishment_orders: Vec::new(),
            purchase_orders: Vec::new(),
            customer_orders: Vec::new(),
            on_hand: Vec::new(),
            lead_times: Vec::new(),
            demand_adjustments: Vec::new(),
            buffer_profiles: Vec::new(),
            items: Vec::new(),
            decoupling_points: Vec::new(),
            candidates: None,
        }
    }

    /// Candidate pairs, sorted and de-duplicated.
    pub fn candidate_pairs(&self) -> Vec<ProductLocationPair> {
        let mut pairs: Vec<ProductLocationPair> = match &self.candidates {
            Some(explicit) => explicit.clone(),
            None => self.sales.iter().map(|r| r.pair.clone()).collect(),
        };
        pairs.sort();
        pairs.dedup();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_rows() {
        let raw = r#"{
            "evaluation_date": "2024-06-30",
            "sales": [
                {"product_id": "SKU-1", "location_id": "WH-1", "sales_date": "2024-06-29", "quantity_sold": 4},
                {"product_id": "SKU-1", "location_id": "WH-1", "sales_date": "2024-06-30", "quantity_sold": 6}
            ],
            "replenishment_orders": [
                {"product_id": "SKU-1", "location_id": "WH-1", "order_date": "2024-06-01", "ordered_qty": 50}
            ],
            "on_hand": [{"product_id": "SKU-1", "location_id": "WH-1", "on_hand": 80}],
            "items": [{"product_id": "SKU-1", "location_id": "WH-1", "is_core_item": true}]
        }"#;

        let snapshot: PlanningSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.sales.len(), 2);
        assert_eq!(snapshot.replenishment_orders[0].order.ordered_qty, 50.0);
        assert!(snapshot.items[0].is_core_item);
        assert_eq!(snapshot.candidate_pairs().len(), 1);
    }
}
