//! Demand analytics batch: statistics, usage share and bullwhip per pair.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ddmrp_core::ProductLocationPair;
use ddmrp_demand::{
    BacktestReport, BullwhipAnalysis, DemandStatistics, HistoricalSalesRecord, SalesWindow,
    UsageAnalysis, analyze_usage, backtest_adu, group_by_pair,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalyticsConfig;
use crate::error::ErrorEntry;
use crate::snapshot::ReplenishmentOrderRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandAnalysis {
    pub pair: ProductLocationPair,
    pub statistics: DemandStatistics,
    /// Mean daily demand over the lookback window (zero-sales days included).
    pub adu: f64,
    pub usage: Option<UsageAnalysis>,
    pub bullwhip: BullwhipAnalysis,
    pub backtest: Option<BacktestReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandAnalyticsReport {
    pub evaluation_date: NaiveDate,
    pub lookback_days: u32,
    /// Serialized as a list; every analysis carries its own pair.
    #[serde(with = "analyses_by_pair")]
    pub analyses: BTreeMap<ProductLocationPair, DemandAnalysis>,
    pub errors: Vec<ErrorEntry>,
}

mod analyses_by_pair {
    use std::collections::BTreeMap;

    use ddmrp_core::ProductLocationPair;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DemandAnalysis;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<ProductLocationPair, DemandAnalysis>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ProductLocationPair, DemandAnalysis>, D::Error> {
        let rows = Vec::<DemandAnalysis>::deserialize(deserializer)?;
        Ok(rows.into_iter().map(|a| (a.pair.clone(), a)).collect())
    }
}

impl DemandAnalyticsReport {
    pub fn get(&self, pair: &ProductLocationPair) -> Option<&DemandAnalysis> {
        self.analyses.get(pair)
    }
}

/// Analyse every pair present in `sales`.
///
/// Bad records fail only their own pair; the rest of the feed is still analysed.
pub fn run_demand_analytics(
    sales: &[HistoricalSalesRecord],
    replenishment_orders: &[ReplenishmentOrderRow],
    evaluation_date: NaiveDate,
    config: &AnalyticsConfig,
) -> DemandAnalyticsReport {
    let window = SalesWindow::ending_on(evaluation_date, config.lookback_days);
    info!(
        records = sales.len(),
        lookback_days = config.lookback_days,
        %evaluation_date,
        "demand analytics started"
    );

    let mut errors = Vec::new();

    // Usage shares need the whole location; drop invalid rows so one bad pair
    // does not blank every other pair's share.
    let valid: Vec<HistoricalSalesRecord> = sales
        .iter()
        .filter(|r| r.validate().is_ok())
        .cloned()
        .collect();
    let usage: BTreeMap<ProductLocationPair, UsageAnalysis> = match analyze_usage(&valid, window) {
        Ok(rows) => rows.into_iter().map(|u| (u.pair.clone(), u)).collect(),
        Err(e) => {
            warn!(error = %e, "usage analysis failed");
            BTreeMap::new()
        }
    };

    let mut orders_by_pair: BTreeMap<&ProductLocationPair, Vec<f64>> = BTreeMap::new();
    for row in replenishment_orders {
        if window.contains(row.order.order_date) {
            orders_by_pair.entry(&row.pair).or_default().push(row.order.ordered_qty);
        }
    }

    let mut analyses = BTreeMap::new();
    for (pair, records) in group_by_pair(sales) {
        let quantities = match window.quantities(&pair, records.iter().copied()) {
            Ok(q) => q,
            Err(e) => {
                warn!(pair = %pair, error = %e, "skipping pair in demand analytics");
                errors.push(ErrorEntry::new(pair, &e));
                continue;
            }
        };
        let daily = match window.daily_series(&pair, records.iter().copied()) {
            Ok(series) => series,
            Err(e) => {
                warn!(pair = %pair, error = %e, "skipping pair in demand analytics");
                errors.push(ErrorEntry::new(pair, &e));
                continue;
            }
        };

        let statistics = DemandStatistics::compute(&quantities);
        let adu = if daily.is_empty() {
            0.0
        } else {
            daily.iter().sum::<f64>() / daily.len() as f64
        };
        let orders = orders_by_pair.get(&pair).map(Vec::as_slice).unwrap_or(&[]);
        let bullwhip = BullwhipAnalysis::analyze(&daily, orders);
        let backtest = backtest_adu(&daily, config.backtest_folds).ok();

        debug!(
            pair = %pair,
            samples = statistics.sample_count,
            cv = statistics.cv,
            bullwhip_ratio = bullwhip.ratio,
            "pair analysed"
        );

        analyses.insert(
            pair.clone(),
            DemandAnalysis {
                usage: usage.get(&pair).cloned(),
                pair,
                statistics,
                adu,
                bullwhip,
                backtest,
            },
        );
    }

    info!(
        analysed = analyses.len(),
        errored = errors.len(),
        "demand analytics finished"
    );

    DemandAnalyticsReport {
        evaluation_date,
        lookback_days: config.lookback_days,
        analyses,
        errors,
    }
}
