use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use ddmrp_core::{LocationId, ProductId};
use ddmrp_decoupling::FactorSource;
use ddmrp_infra::{
    BufferRecalculationRunner, DesignationRunner, EngineConfig, InMemoryDecouplingRegistry,
    InMemoryPlanningData, PairFilter, PlanningSnapshot, SnapshotFactorSource,
    run_demand_analytics, run_pipeline,
};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "ddmrp-batch", version, about = "DDMRP planning batches over a JSON snapshot")]
struct Cli {
    /// Engine configuration (JSON).
    config: PathBuf,

    /// Planning snapshot (JSON).
    snapshot: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    stage: Option<Stage>,
}

#[derive(Debug, Subcommand)]
enum Stage {
    /// Demand statistics, usage and bullwhip per pair.
    Analytics,
    /// Score candidates and designate decoupling points.
    Designate,
    /// Recalculate buffers for the snapshot's decoupling points.
    Buffers {
        #[arg(long)]
        product: Option<ProductId>,
        #[arg(long)]
        location: Option<LocationId>,
    },
}

fn main() -> anyhow::Result<()> {
    ddmrp_observability::init();
    let cli = Cli::parse();

    let config = EngineConfig::load(&cli.config)
        .and_then(|c| c.apply_overrides(|key| std::env::var(key).ok()))
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let snapshot = load_snapshot(&cli.snapshot)?;
    let now = Utc::now();

    tracing::info!(
        config = %cli.config.display(),
        snapshot = %cli.snapshot.display(),
        evaluation_date = %snapshot.evaluation_date,
        "ddmrp batch starting"
    );

    match cli.stage {
        None => emit(&cli, &run_pipeline(&config, &snapshot, now)?),
        Some(Stage::Analytics) => {
            let report = run_demand_analytics(
                &snapshot.sales,
                &snapshot.replenishment_orders,
                snapshot.evaluation_date,
                &config.analytics,
            );
            emit(&cli, &report)
        }
        Some(Stage::Designate) => {
            let analytics = run_demand_analytics(
                &snapshot.sales,
                &snapshot.replenishment_orders,
                snapshot.evaluation_date,
                &config.analytics,
            );
            let source: Arc<dyn FactorSource> =
                Arc::new(SnapshotFactorSource::new(analytics, &snapshot));
            let registry = Arc::new(InMemoryDecouplingRegistry::with_points(
                snapshot.decoupling_points.iter().cloned(),
            ));
            let report = DesignationRunner::new(config.designation.clone()).run(
                &snapshot.candidate_pairs(),
                registry,
                source,
                now,
            )?;
            emit(&cli, &report)
        }
        Some(Stage::Buffers {
            ref product,
            ref location,
        }) => {
            let registry = InMemoryDecouplingRegistry::with_points(
                snapshot.decoupling_points.iter().cloned(),
            );
            let data = InMemoryPlanningData::from_snapshot(&snapshot);
            let filter = PairFilter {
                product_id: product.clone(),
                location_id: location.clone(),
            };
            let report = BufferRecalculationRunner::new(config.buffers.clone()).run(
                &registry,
                &data,
                snapshot.evaluation_date,
                &filter,
            )?;
            emit(&cli, &report)
        }
    }
}

fn load_snapshot(path: &Path) -> anyhow::Result<PlanningSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn emit<T: Serialize>(cli: &Cli, report: &T) -> anyhow::Result<()> {
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    match &cli.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("writing report {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
