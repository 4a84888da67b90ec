//! Buffer recalculation batch over active decoupling points.

use chrono::{DateTime, NaiveDate, Utc};
use ddmrp_buffer::{
    BufferBreach, BufferZoneSet, LeadTimeCategory, NetFlowSnapshot, PlanningPriority,
    ProfileCatalog, ProjectionInput, QualifiedDemand, ReceiptCalendar, ReplenishmentProjection,
    ZoneInputs, buffer_penetration, on_order, qualify_demand,
};
use ddmrp_core::{DomainError, DomainResult, LocationId, ProductId, ProductLocationPair, RunId};
use ddmrp_decoupling::{DecouplingPoint, DecouplingRegistry};
use ddmrp_demand::{AduEstimate, AduEstimator, DafSchedule};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::BufferRunConfig;
use crate::data_source::PlanningDataSource;
use crate::error::{ErrorEntry, RunError};
use crate::pool::parallel_map;

/// Optional narrowing of a recalculation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairFilter {
    pub product_id: Option<ProductId>,
    pub location_id: Option<LocationId>,
}

impl PairFilter {
    pub fn matches(&self, pair: &ProductLocationPair) -> bool {
        self.product_id.as_ref().is_none_or(|p| *p == pair.product_id)
            && self.location_id.as_ref().is_none_or(|l| *l == pair.location_id)
    }
}

/// Everything recomputed for one decoupled pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferPlan {
    pub pair: ProductLocationPair,
    pub profile_id: String,
    pub adu: AduEstimate,
    pub dlt_days: f64,
    pub lead_time_category: LeadTimeCategory,
    pub zones: BufferZoneSet,
    pub qualified_demand: QualifiedDemand,
    pub net_flow: NetFlowSnapshot,
    pub penetration: f64,
    pub priority: PlanningPriority,
    pub breach: Option<BufferBreach>,
    pub projection: ReplenishmentProjection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferRecalculationReport {
    pub run_id: RunId,
    pub evaluation_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub requested: usize,
    pub succeeded: usize,
    pub errored: usize,
    pub plans: Vec<BufferPlan>,
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone)]
pub struct BufferRecalculationRunner {
    config: BufferRunConfig,
}

impl BufferRecalculationRunner {
    pub fn new(config: BufferRunConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        registry: &dyn DecouplingRegistry,
        data: &dyn PlanningDataSource,
        evaluation_date: NaiveDate,
        filter: &PairFilter,
    ) -> Result<BufferRecalculationReport, RunError> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let cfg = &self.config;

        let profiles = data.buffer_profiles().map_err(RunError::ProfileCatalog)?;
        let catalog = ProfileCatalog::new(profiles, &cfg.default_profile_id)
            .map_err(RunError::ProfileCatalog)?;
        catalog.resolve(None).map_err(RunError::ProfileCatalog)?;
        let estimator = AduEstimator::new(cfg.adu_window_days).map_err(RunError::Configuration)?;

        let mut points: Vec<DecouplingPoint> = registry
            .list()
            .map_err(RunError::Registry)?
            .into_iter()
            .filter(|p| p.is_strategic && filter.matches(&p.pair))
            .collect();
        points.sort_by(|a, b| a.pair.cmp(&b.pair));
        points.truncate(cfg.batch_size);

        info!(
            run_id = %run_id,
            %evaluation_date,
            requested = points.len(),
            "buffer recalculation started"
        );

        let ctx = PairPlanning {
            config: cfg,
            catalog: &catalog,
            estimator,
            data,
            evaluation_date,
        };
        let outcomes = points
            .iter()
            .map(|point| point.pair.clone())
            .zip(parallel_map(&points, cfg.max_concurrent, |point| ctx.plan(point))?)
            .map(|(pair, outcome)| (pair, outcome.map_err(DomainError::from).and_then(|r| r)));

        let mut plans = Vec::new();
        let mut errors = Vec::new();
        for (pair, outcome) in outcomes {
            match outcome {
                Ok(plan) => plans.push(plan),
                Err(e) => {
                    warn!(pair = %pair, error = %e, "buffer recalculation failed for pair");
                    errors.push(ErrorEntry::new(pair, &e));
                }
            }
        }

        let report = BufferRecalculationReport {
            run_id,
            evaluation_date,
            started_at,
            finished_at: Utc::now(),
            requested: points.len(),
            succeeded: plans.len(),
            errored: errors.len(),
            plans,
            errors,
        };
        info!(
            run_id = %run_id,
            succeeded = report.succeeded,
            errored = report.errored,
            "buffer recalculation finished"
        );
        Ok(report)
    }
}

struct PairPlanning<'a> {
    config: &'a BufferRunConfig,
    catalog: &'a ProfileCatalog,
    estimator: AduEstimator,
    data: &'a dyn PlanningDataSource,
    evaluation_date: NaiveDate,
}

impl PairPlanning<'_> {
    fn plan(&self, point: &DecouplingPoint) -> DomainResult<BufferPlan> {
        let pair = &point.pair;
        let profile = self.catalog.resolve(point.buffer_profile_id.as_deref())?;

        let sales = self.data.sales_history(pair)?;
        let schedule = DafSchedule::from_entries(self.data.demand_adjustments(pair)?)?;
        let adu = self.estimator.estimate(pair, &sales, self.evaluation_date, &schedule)?;

        let dlt_days = self
            .data
            .lead_time_days(pair)?
            .unwrap_or(self.config.default_dlt_days);
        let zones = BufferZoneSet::calculate(&ZoneInputs::from_profile(
            adu.adu_adjusted,
            Some(dlt_days),
            profile,
        ))?;

        let on_hand = self.data.on_hand(pair)?;
        let purchase_orders = self.data.open_purchase_orders(pair)?;
        for po in &purchase_orders {
            po.validate()?;
        }
        let open_supply = on_order(&purchase_orders);
        let receipts = ReceiptCalendar::from_orders(&purchase_orders);

        let customer_orders = self.data.customer_orders(pair)?;
        let qualified_demand = qualify_demand(
            &customer_orders,
            self.evaluation_date,
            dlt_days,
            zones.tor,
            &self.config.spike,
        )?;

        let net_flow = NetFlowSnapshot::evaluate(on_hand, open_supply, qualified_demand.total, &zones)?;
        let penetration = buffer_penetration(net_flow.nfp, &zones);

        let input = ProjectionInput {
            start_date: self.evaluation_date,
            on_hand,
            on_order: open_supply,
            qualified_demand: qualified_demand.total,
            adu: adu.adu_adjusted,
            zones,
            receipts,
            moq: profile.min_order_qty,
            rounding_multiple: profile.rounding_multiple,
            horizon_days: self.config.horizon_days,
        };
        let projection = ReplenishmentProjection::build(&input, self.config.weeks)?;

        debug!(
            pair = %pair,
            adu = adu.adu_adjusted,
            nfp = net_flow.nfp,
            status = %net_flow.status,
            "buffer recalculated"
        );

        Ok(BufferPlan {
            pair: pair.clone(),
            profile_id: profile.id.clone(),
            lead_time_category: LeadTimeCategory::classify(dlt_days),
            dlt_days,
            zones,
            qualified_demand,
            breach: BufferBreach::detect(net_flow.nfp, &zones),
            priority: PlanningPriority::from_penetration(penetration),
            penetration,
            net_flow,
            projection,
            adu,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_by_product_and_location() {
        let pair = ProductLocationPair::parse("SKU-1", "WH-1").unwrap();
        assert!(PairFilter::default().matches(&pair));
        assert!(
            PairFilter {
                product_id: Some("SKU-1".parse().unwrap()),
                location_id: None
            }
            .matches(&pair)
        );
        assert!(
            !PairFilter {
                product_id: None,
                location_id: Some("WH-2".parse().unwrap())
            }
            .matches(&pair)
        );
    }
}
