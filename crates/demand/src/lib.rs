//! Demand signal module.
//!
//! Turns append-only sales history into the demand inputs of the buffer
//! engine: rolling statistics (mean, standard deviation, CV, variability
//! score), average daily usage adjusted by demand adjustment factors, usage
//! share / volume scoring and bullwhip amplification. Pure, deterministic
//! functions of their inputs (no IO, no clock).

pub mod adu;
pub mod backtest;
pub mod bullwhip;
pub mod sales;
pub mod statistics;
pub mod usage;

pub use adu::{AduEstimate, AduEstimator, DafSchedule, DemandAdjustmentFactor};
pub use backtest::{backtest_adu, BacktestReport, FoldMetrics};
pub use bullwhip::{BullwhipAnalysis, BullwhipSeverity, OrderRecord};
pub use sales::{
    HistoricalSalesRecord, MAX_WINDOW_DAYS, SalesWindow, ensure_window_days, group_by_pair,
};
pub use statistics::{DemandStatistics, VariabilityScale};
pub use usage::{UsageAnalysis, analyze_usage};
