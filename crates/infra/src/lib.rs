//! Infrastructure layer: configuration, in-memory collaborators and the
//! batch runners that drive the planning engine over many pairs.
//!
//! Domain crates stay pure; everything that touches threads, clocks or
//! external lookups lives here.

pub mod analytics;
pub mod buffer_runner;
pub mod config;
pub mod data_source;
pub mod designation_runner;
pub mod error;
pub mod lookup;
pub mod pipeline;
pub mod pool;
pub mod registry;
pub mod retry;
pub mod snapshot;

pub use analytics::{DemandAnalysis, DemandAnalyticsReport, run_demand_analytics};
pub use buffer_runner::{BufferPlan, BufferRecalculationReport, BufferRecalculationRunner, PairFilter};
pub use config::{AnalyticsConfig, BufferRunConfig, ConfigError, DesignationConfig, EngineConfig};
pub use data_source::{InMemoryPlanningData, PlanningDataSource, SnapshotFactorSource};
pub use designation_runner::{DesignationReport, DesignationRunner};
pub use error::{ErrorEntry, RunError};
pub use lookup::BoundedLookup;
pub use pipeline::{PipelineReport, run_pipeline};
pub use registry::InMemoryDecouplingRegistry;
pub use retry::{BackoffStrategy, RetryPolicy};
pub use snapshot::PlanningSnapshot;
