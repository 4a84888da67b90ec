//! Planning data collaborators: the buffer batch's input feeds and the
//! designation batch's factor source, both backed by a [`PlanningSnapshot`].

use std::collections::BTreeMap;

use ddmrp_buffer::{BufferProfile, CustomerOrder, DEFAULT_DLT_DAYS, OpenPurchaseOrder};
use ddmrp_core::{DomainResult, ProductLocationPair};
use ddmrp_decoupling::{FactorSignals, FactorSource, FactorValues, ScoringCapabilities, ScoringMode};
use ddmrp_demand::{DemandAdjustmentFactor, HistoricalSalesRecord};

use crate::analytics::DemandAnalyticsReport;
use crate::snapshot::{ItemAttributesRow, PlanningSnapshot};

/// Per-pair input feeds for buffer recalculation.
pub trait PlanningDataSource: Send + Sync {
    /// All configured profiles. A failure here is fatal for the whole run.
    fn buffer_profiles(&self) -> DomainResult<Vec<BufferProfile>>;

    fn sales_history(&self, pair: &ProductLocationPair) -> DomainResult<Vec<HistoricalSalesRecord>>;

    fn demand_adjustments(
        &self,
        pair: &ProductLocationPair,
    ) -> DomainResult<Vec<DemandAdjustmentFactor>>;

    fn on_hand(&self, pair: &ProductLocationPair) -> DomainResult<f64>;

    fn open_purchase_orders(&self, pair: &ProductLocationPair) -> DomainResult<Vec<OpenPurchaseOrder>>;

    fn customer_orders(&self, pair: &ProductLocationPair) -> DomainResult<Vec<CustomerOrder>>;

    /// Decoupled lead time, `None` when unknown.
    fn lead_time_days(&self, pair: &ProductLocationPair) -> DomainResult<Option<f64>>;
}

fn index<T: Clone>(
    rows: &[T],
    key: impl Fn(&T) -> &ProductLocationPair,
) -> BTreeMap<ProductLocationPair, Vec<T>> {
    let mut map: BTreeMap<ProductLocationPair, Vec<T>> = BTreeMap::new();
    for row in rows {
        map.entry(key(row).clone()).or_default().push(row.clone());
    }
    map
}

/// Snapshot-backed feeds, indexed by pair once at construction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanningData {
    profiles: Vec<BufferProfile>,
    sales: BTreeMap<ProductLocationPair, Vec<HistoricalSalesRecord>>,
    adjustments: BTreeMap<ProductLocationPair, Vec<DemandAdjustmentFactor>>,
    on_hand: BTreeMap<ProductLocationPair, f64>,
    purchase_orders: BTreeMap<ProductLocationPair, Vec<OpenPurchaseOrder>>,
    customer_orders: BTreeMap<ProductLocationPair, Vec<CustomerOrder>>,
    lead_times: BTreeMap<ProductLocationPair, f64>,
}

impl InMemoryPlanningData {
    /// A snapshot without profiles gets the built-in default profile.
    pub fn from_snapshot(snapshot: &PlanningSnapshot) -> Self {
        let profiles = if snapshot.buffer_profiles.is_empty() {
            vec![BufferProfile::default()]
        } else {
            snapshot.buffer_profiles.clone()
        };
        let mut on_hand = BTreeMap::new();
        for row in &snapshot.on_hand {
            *on_hand.entry(row.pair.clone()).or_insert(0.0) += row.on_hand;
        }
        Self {
            profiles,
            sales: index(&snapshot.sales, |r| &r.pair),
            adjustments: index(&snapshot.demand_adjustments, |r| &r.pair),
            on_hand,
            purchase_orders: index(&snapshot.purchase_orders, |r| &r.pair),
            customer_orders: index(&snapshot.customer_orders, |r| &r.pair),
            lead_times: snapshot
                .lead_times
                .iter()
                .map(|r| (r.pair.clone(), r.dlt_days))
                .collect(),
        }
    }
}

fn rows<T: Clone>(map: &BTreeMap<ProductLocationPair, Vec<T>>, pair: &ProductLocationPair) -> Vec<T> {
    map.get(pair).cloned().unwrap_or_default()
}

impl PlanningDataSource for InMemoryPlanningData {
    fn buffer_profiles(&self) -> DomainResult<Vec<BufferProfile>> {
        Ok(self.profiles.clone())
    }

    fn sales_history(&self, pair: &ProductLocationPair) -> DomainResult<Vec<HistoricalSalesRecord>> {
        Ok(rows(&self.sales, pair))
    }

    fn demand_adjustments(
        &self,
        pair: &ProductLocationPair,
    ) -> DomainResult<Vec<DemandAdjustmentFactor>> {
        Ok(rows(&self.adjustments, pair))
    }

    fn on_hand(&self, pair: &ProductLocationPair) -> DomainResult<f64> {
        Ok(self.on_hand.get(pair).copied().unwrap_or(0.0))
    }

    fn open_purchase_orders(&self, pair: &ProductLocationPair) -> DomainResult<Vec<OpenPurchaseOrder>> {
        Ok(rows(&self.purchase_orders, pair))
    }

    fn customer_orders(&self, pair: &ProductLocationPair) -> DomainResult<Vec<CustomerOrder>> {
        Ok(rows(&self.customer_orders, pair))
    }

    fn lead_time_days(&self, pair: &ProductLocationPair) -> DomainResult<Option<f64>> {
        Ok(self.lead_times.get(pair).copied())
    }
}

/// Factor values assembled from demand analytics plus item master attributes.
///
/// Pairs without analytics get no demand factors (variability, volume,
/// bullwhip), which the scorer reports as insufficient data.
#[derive(Debug, Clone)]
pub struct SnapshotFactorSource {
    analytics: DemandAnalyticsReport,
    items: BTreeMap<ProductLocationPair, ItemAttributesRow>,
    lead_times: BTreeMap<ProductLocationPair, f64>,
}

impl SnapshotFactorSource {
    pub fn new(analytics: DemandAnalyticsReport, snapshot: &PlanningSnapshot) -> Self {
        Self {
            analytics,
            items: snapshot
                .items
                .iter()
                .map(|row| (row.pair.clone(), row.clone()))
                .collect(),
            lead_times: snapshot
                .lead_times
                .iter()
                .map(|r| (r.pair.clone(), r.dlt_days))
                .collect(),
        }
    }

    pub fn signals(&self, pair: &ProductLocationPair) -> FactorSignals {
        let analysis = self.analytics.get(pair);
        let item = self.items.get(pair);

        FactorSignals {
            variability_score: analysis.map(|a| a.statistics.variability_score),
            volume_score: analysis.map(|a| a.usage.as_ref().map_or(20.0, |u| u.volume_score)),
            bullwhip_score: analysis.map(|a| a.bullwhip.score),
            lead_time_days: Some(self.lead_times.get(pair).copied().unwrap_or(DEFAULT_DLT_DAYS)),
            moq: item.and_then(|i| i.moq),
            adu: analysis.map(|a| a.adu),
            is_core_item: item.is_some_and(|i| i.is_core_item),
            sales_share_pct: analysis
                .and_then(|a| a.usage.as_ref())
                .map_or(0.0, |u| u.percentage_of_total_usage),
            supplier_otif_pct: item.and_then(|i| i.supplier_otif_pct),
            supplier_count: item.and_then(|i| i.supplier_count),
            holding_cost: Some(item.and_then(|i| i.holding_cost_score).unwrap_or(0.0)),
            storage_intensity: Some(item.and_then(|i| i.storage_intensity_score).unwrap_or(0.0)),
            bom_parents_using: item.and_then(|i| i.bom_parents_using),
            bom_total_parents: item.and_then(|i| i.bom_total_parents),
        }
    }
}

impl FactorSource for SnapshotFactorSource {
    /// Component-aware scoring needs BOM data for at least one item.
    fn capabilities(&self) -> ScoringCapabilities {
        ScoringCapabilities {
            component_criticality: self
                .items
                .values()
                .any(|i| i.bom_total_parents.is_some_and(|n| n > 0)),
        }
    }

    fn factor_values(
        &self,
        pair: &ProductLocationPair,
        mode: ScoringMode,
    ) -> DomainResult<FactorValues> {
        let mut signals = self.signals(pair);
        if mode == ScoringMode::ComponentAware && !signals.has_component_data() {
            // Item not used in any BOM.
            signals.bom_parents_using = Some(0);
            signals.bom_total_parents = Some(1);
        }
        Ok(signals.to_values(mode))
    }

    fn buffer_profile_id(&self, pair: &ProductLocationPair) -> DomainResult<Option<String>> {
        Ok(self
            .items
            .get(pair)
            .and_then(|i| i.buffer_profile_id.clone())
            .filter(|p| !p.trim().is_empty()))
    }
}
