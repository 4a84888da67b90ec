//! Engine configuration.
//!
//! One immutable object per run: loaded from JSON, optionally overridden from
//! the environment, validated, then passed into every batch invocation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ddmrp_buffer::{DEFAULT_DLT_DAYS, DEFAULT_PROFILE_ID, MAX_HORIZON_DAYS, SpikeParameters};
use ddmrp_core::{DomainError, DomainResult};
use ddmrp_decoupling::{DecisionThresholds, FactorWeights, ScoringMode};
use ddmrp_demand::ensure_window_days;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid override {key}={value}")]
    Override { key: String, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub designation: DesignationConfig,
    pub buffers: BufferRunConfig,
    pub analytics: AnalyticsConfig,
}

/// Decoupling designation batch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignationConfig {
    pub batch_size: usize,
    /// Auto-designate cut-off; values ≤ 1.0 are read as fractions.
    pub threshold: f64,
    pub review_threshold: f64,
    pub scenario_name: String,
    pub max_concurrent: usize,
    pub lookup_timeout_ms: u64,
    pub lookup_retry: RetryPolicy,
    pub preferred_mode: ScoringMode,
    /// Factor name -> weight. Defaults per scoring mode when absent; adapted
    /// to whichever mode the run resolves to when present.
    pub weights: Option<BTreeMap<String, f64>>,
    /// Buffer profile bound to new designations whose item carries none.
    pub default_profile_id: String,
}

impl Default for DesignationConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            threshold: 70.0,
            review_threshold: 50.0,
            scenario_name: "default".to_string(),
            max_concurrent: 4,
            lookup_timeout_ms: 2_000,
            lookup_retry: RetryPolicy::default(),
            preferred_mode: ScoringMode::ComponentAware,
            weights: None,
            default_profile_id: DEFAULT_PROFILE_ID.to_string(),
        }
    }
}

impl DesignationConfig {
    pub fn thresholds(&self) -> DomainResult<DecisionThresholds> {
        DecisionThresholds::new(self.threshold, self.review_threshold)
    }

    pub fn weights_for(&self, mode: ScoringMode) -> DomainResult<FactorWeights> {
        match &self.weights {
            Some(named) => FactorWeights::from_named(named.iter().map(|(k, v)| (k.as_str(), *v)))?
                .for_mode(mode),
            None => Ok(FactorWeights::default_for(mode)),
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Buffer recalculation batch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferRunConfig {
    pub batch_size: usize,
    pub max_concurrent: usize,
    pub adu_window_days: u32,
    pub default_dlt_days: f64,
    pub horizon_days: u32,
    pub weeks: u32,
    pub default_profile_id: String,
    pub spike: SpikeParameters,
}

impl Default for BufferRunConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_concurrent: 4,
            adu_window_days: 90,
            default_dlt_days: DEFAULT_DLT_DAYS,
            horizon_days: 14,
            weeks: 4,
            default_profile_id: DEFAULT_PROFILE_ID.to_string(),
            spike: SpikeParameters::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub lookback_days: u32,
    pub backtest_folds: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            backtest_folds: 5,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `DDMRP_*` overrides looked up through `lookup`
    /// (pass `|k| std::env::var(k).ok()` for the process environment).
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup("DDMRP_BATCH_SIZE") {
            let n = parse_override("DDMRP_BATCH_SIZE", &v)?;
            self.designation.batch_size = n;
            self.buffers.batch_size = n;
        }
        if let Some(v) = lookup("DDMRP_THRESHOLD") {
            self.designation.threshold = parse_override("DDMRP_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("DDMRP_SCENARIO") {
            if v.trim().is_empty() {
                return Err(ConfigError::Override {
                    key: "DDMRP_SCENARIO".into(),
                    value: v,
                });
            }
            self.designation.scenario_name = v;
        }
        if let Some(v) = lookup("DDMRP_MAX_CONCURRENT") {
            let n = parse_override("DDMRP_MAX_CONCURRENT", &v)?;
            self.designation.max_concurrent = n;
            self.buffers.max_concurrent = n;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.designation;
        if d.batch_size == 0 {
            return Err(ConfigError::Invalid("designation.batch_size must be > 0".into()));
        }
        if d.max_concurrent == 0 {
            return Err(ConfigError::Invalid("designation.max_concurrent must be > 0".into()));
        }
        if d.scenario_name.trim().is_empty() {
            return Err(ConfigError::Invalid("designation.scenario_name is empty".into()));
        }
        d.thresholds()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        // The run may fall back to plain mode, so both tables must hold.
        for mode in [ScoringMode::Plain, ScoringMode::ComponentAware] {
            d.weights_for(mode)
                .map_err(|e| ConfigError::Invalid(format!("{mode} weights: {e}")))?;
        }
        if d.default_profile_id.trim().is_empty() {
            return Err(ConfigError::Invalid("designation.default_profile_id is empty".into()));
        }

        let b = &self.buffers;
        if b.batch_size == 0 || b.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "buffers.batch_size and buffers.max_concurrent must be > 0".into(),
            ));
        }
        ensure_window_days("buffers.adu_window_days", b.adu_window_days).map_err(invalid)?;
        ensure_horizon("buffers.horizon_days", b.horizon_days)?;
        ensure_horizon("buffers.weeks (in days)", b.weeks.saturating_mul(7))?;
        if !b.default_dlt_days.is_finite() || b.default_dlt_days < 0.0 {
            return Err(ConfigError::Invalid("buffers.default_dlt_days must be >= 0".into()));
        }
        b.spike
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        ensure_window_days("analytics.lookback_days", self.analytics.lookback_days)
            .map_err(invalid)?;
        Ok(())
    }
}

fn invalid(e: DomainError) -> ConfigError {
    ConfigError::Invalid(e.to_string())
}

fn ensure_horizon(field: &str, days: u32) -> Result<(), ConfigError> {
    if days == 0 || days > MAX_HORIZON_DAYS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_HORIZON_DAYS} days (got {days})"
        )));
    }
    Ok(())
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Override {
        key: key.to_string(),
        value: value.to_string(),
    })
}
