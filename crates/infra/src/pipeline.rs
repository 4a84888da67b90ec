//! Snapshot pipeline: analytics, then designation, then buffer recalculation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ddmrp_decoupling::{DecouplingPoint, DecouplingRegistry, FactorSource};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analytics::{DemandAnalyticsReport, run_demand_analytics};
use crate::buffer_runner::{BufferRecalculationReport, BufferRecalculationRunner, PairFilter};
use crate::config::EngineConfig;
use crate::data_source::{InMemoryPlanningData, SnapshotFactorSource};
use crate::designation_runner::{DesignationReport, DesignationRunner};
use crate::error::RunError;
use crate::registry::InMemoryDecouplingRegistry;
use crate::snapshot::PlanningSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub analytics: DemandAnalyticsReport,
    pub designation: DesignationReport,
    pub buffers: BufferRecalculationReport,
    /// Registry contents after designation.
    pub decoupling_points: Vec<DecouplingPoint>,
}

pub fn run_pipeline(
    config: &EngineConfig,
    snapshot: &PlanningSnapshot,
    now: DateTime<Utc>,
) -> Result<PipelineReport, RunError> {
    info!(
        evaluation_date = %snapshot.evaluation_date,
        sales = snapshot.sales.len(),
        existing_points = snapshot.decoupling_points.len(),
        "planning pipeline started"
    );

    let analytics = run_demand_analytics(
        &snapshot.sales,
        &snapshot.replenishment_orders,
        snapshot.evaluation_date,
        &config.analytics,
    );

    let registry = Arc::new(InMemoryDecouplingRegistry::with_points(
        snapshot.decoupling_points.iter().cloned(),
    ));
    let source: Arc<dyn FactorSource> =
        Arc::new(SnapshotFactorSource::new(analytics.clone(), snapshot));

    let designation = DesignationRunner::new(config.designation.clone()).run(
        &snapshot.candidate_pairs(),
        registry.clone(),
        source,
        now,
    )?;

    let data = InMemoryPlanningData::from_snapshot(snapshot);
    let buffers = BufferRecalculationRunner::new(config.buffers.clone()).run(
        registry.as_ref(),
        &data,
        snapshot.evaluation_date,
        &PairFilter::default(),
    )?;

    let decoupling_points = registry.list().map_err(RunError::Registry)?;
    info!(
        designated = designation.auto_designated,
        buffers = buffers.succeeded,
        "planning pipeline finished"
    );

    Ok(PipelineReport {
        analytics,
        designation,
        buffers,
        decoupling_points,
    })
}
