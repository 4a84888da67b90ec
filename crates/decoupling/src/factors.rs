//! Declarative factor table: `{factor -> (value, weight)}`.
//!
//! Weights are validated once when the table is built; the scorer reduces
//! any validated table generically, so adding a factor means adding a variant
//! and a default weight, never touching the reduction.

use std::collections::BTreeMap;

use ddmrp_core::{DomainError, DomainResult, ValueObject};
use serde::{Deserialize, Serialize};

use crate::scorer::ScoringMode;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.001;

/// Scoring factors. Each value is a normalised 0–100 score.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Variability,
    Criticality,
    HoldingCost,
    SupplierReliability,
    LeadTime,
    Volume,
    StorageIntensity,
    MoqRigidity,
    Bullwhip,
    ComponentCriticality,
}

impl Factor {
    pub const ALL: [Factor; 10] = [
        Factor::Variability,
        Factor::Criticality,
        Factor::HoldingCost,
        Factor::SupplierReliability,
        Factor::LeadTime,
        Factor::Volume,
        Factor::StorageIntensity,
        Factor::MoqRigidity,
        Factor::Bullwhip,
        Factor::ComponentCriticality,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Factor::Variability => "variability",
            Factor::Criticality => "criticality",
            Factor::HoldingCost => "holding_cost",
            Factor::SupplierReliability => "supplier_reliability",
            Factor::LeadTime => "lead_time",
            Factor::Volume => "volume",
            Factor::StorageIntensity => "storage_intensity",
            Factor::MoqRigidity => "moq_rigidity",
            Factor::Bullwhip => "bullwhip",
            Factor::ComponentCriticality => "component_criticality",
        }
    }

    /// Default weight in plain mode.
    fn plain_weight(self) -> f64 {
        match self {
            Factor::Variability => 0.20,
            Factor::Criticality => 0.15,
            Factor::HoldingCost => 0.10,
            Factor::SupplierReliability => 0.10,
            Factor::LeadTime => 0.10,
            Factor::Volume => 0.10,
            Factor::StorageIntensity => 0.05,
            Factor::MoqRigidity => 0.05,
            Factor::Bullwhip => 0.15,
            Factor::ComponentCriticality => 0.0,
        }
    }
}

impl core::fmt::Display for Factor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Factor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Factor::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| DomainError::invalid_config(format!("unknown scoring factor '{s}'")))
    }
}

/// Validated weight vector (non-negative, summing to 1 ± [`WEIGHT_TOLERANCE`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Factor, f64>", into = "BTreeMap<Factor, f64>")]
pub struct FactorWeights {
    weights: BTreeMap<Factor, f64>,
}

impl ValueObject for FactorWeights {}

impl FactorWeights {
    pub fn new(weights: BTreeMap<Factor, f64>) -> DomainResult<Self> {
        if weights.is_empty() {
            return Err(DomainError::invalid_config("weight vector is empty"));
        }
        for (factor, weight) in &weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(DomainError::invalid_config(format!(
                    "weight for {factor} must be a non-negative number (got {weight})"
                )));
            }
        }
        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(DomainError::invalid_config(format!(
                "weights must sum to 1.0 (got {sum:.4})"
            )));
        }
        Ok(Self { weights })
    }

    /// Build from externally supplied `name -> weight` pairs.
    pub fn from_named<'a>(
        weights: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> DomainResult<Self> {
        let mut table = BTreeMap::new();
        for (name, weight) in weights {
            table.insert(name.parse::<Factor>()?, weight);
        }
        Self::new(table)
    }

    /// Default weights for a scoring mode.
    ///
    /// Component-aware mode rescales the plain weights by 0.9 and gives
    /// component criticality the remaining 0.10.
    pub fn default_for(mode: ScoringMode) -> Self {
        let plain = Factor::ALL
            .into_iter()
            .filter(|f| *f != Factor::ComponentCriticality)
            .map(|f| (f, f.plain_weight()));

        let weights = match mode {
            ScoringMode::Plain => plain.collect(),
            ScoringMode::ComponentAware => plain
                .map(|(f, w)| (f, w * 0.9))
                .chain(std::iter::once((Factor::ComponentCriticality, 0.10)))
                .collect(),
        };
        Self { weights }
    }

    /// Adapt a configured table to the mode a run resolved to.
    ///
    /// Plain mode drops the component criticality weight and renormalises the
    /// rest. Component-aware mode keeps a positive component weight as is;
    /// otherwise it applies the same 0.9 / 0.10 split as [`default_for`].
    ///
    /// [`default_for`]: FactorWeights::default_for
    pub fn for_mode(&self, mode: ScoringMode) -> DomainResult<Self> {
        let component = self.get(Factor::ComponentCriticality).unwrap_or(0.0);
        let rest = self
            .weights
            .iter()
            .filter(|(f, _)| **f != Factor::ComponentCriticality)
            .map(|(f, w)| (*f, *w));

        let weights = match mode {
            ScoringMode::Plain if component == 0.0 => rest.collect(),
            ScoringMode::Plain => {
                let total: f64 = rest.clone().map(|(_, w)| w).sum();
                if total <= WEIGHT_TOLERANCE {
                    return Err(DomainError::invalid_config(
                        "weights leave nothing for plain scoring once component criticality is dropped",
                    ));
                }
                rest.map(|(f, w)| (f, w / total)).collect()
            }
            ScoringMode::ComponentAware if component > 0.0 => return Ok(self.clone()),
            ScoringMode::ComponentAware => rest
                .map(|(f, w)| (f, w * 0.9))
                .chain(std::iter::once((Factor::ComponentCriticality, 0.10)))
                .collect(),
        };
        Self::new(weights)
    }

    pub fn get(&self, factor: Factor) -> Option<f64> {
        self.weights.get(&factor).copied()
    }

    pub fn contains(&self, factor: Factor) -> bool {
        self.weights.contains_key(&factor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.weights.iter().map(|(f, w)| (*f, *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl TryFrom<BTreeMap<Factor, f64>> for FactorWeights {
    type Error = DomainError;

    fn try_from(value: BTreeMap<Factor, f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FactorWeights> for BTreeMap<Factor, f64> {
    fn from(value: FactorWeights) -> Self {
        value.weights
    }
}

/// Per-pair factor scores, each expected in 0–100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorValues {
    values: BTreeMap<Factor, f64>,
}

impl ValueObject for FactorValues {}

impl FactorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, factor: Factor, value: f64) -> Self {
        self.set(factor, value);
        self
    }

    pub fn set(&mut self, factor: Factor, value: f64) {
        self.values.insert(factor, value);
    }

    pub fn get(&self, factor: Factor) -> Option<f64> {
        self.values.get(&factor).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Factor, f64)> for FactorValues {
    fn from_iter<T: IntoIterator<Item = (Factor, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(weights: &FactorWeights) -> f64 {
        weights.iter().map(|(_, w)| w).sum()
    }

    #[test]
    fn default_weights_sum_to_one() {
        let plain = FactorWeights::default_for(ScoringMode::Plain);
        let aware = FactorWeights::default_for(ScoringMode::ComponentAware);

        assert_eq!(plain.len(), 9);
        assert!(!plain.contains(Factor::ComponentCriticality));
        assert!((sum(&plain) - 1.0).abs() <= WEIGHT_TOLERANCE);

        assert_eq!(aware.len(), 10);
        assert_eq!(aware.get(Factor::ComponentCriticality), Some(0.10));
        assert!((sum(&aware) - 1.0).abs() <= WEIGHT_TOLERANCE);
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let err = FactorWeights::from_named([("variability", 0.5), ("volume", 0.4)]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfiguration(_)));
    }

    #[test]
    fn accepts_sum_within_tolerance() {
        assert!(FactorWeights::from_named([("variability", 0.5), ("volume", 0.5005)]).is_ok());
    }

    #[test]
    fn rejects_negative_and_unknown_factors() {
        assert!(FactorWeights::from_named([("variability", 1.2), ("volume", -0.2)]).is_err());
        assert!(FactorWeights::from_named([("colour", 1.0)]).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: FactorWeights =
            serde_json::from_str(r#"{"lead_time": 0.4, "bullwhip": 0.6}"#).unwrap();
        assert_eq!(ok.get(Factor::Bullwhip), Some(0.6));

        let bad = serde_json::from_str::<FactorWeights>(r#"{"lead_time": 0.4}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn factor_names_round_trip_through_from_str() {
        for factor in Factor::ALL {
            assert_eq!(factor.as_str().parse::<Factor>().unwrap(), factor);
        }
    }

    #[test]
    fn configured_weights_adapt_to_either_mode() {
        let configured = FactorWeights::from_named([
            ("variability", 0.5),
            ("volume", 0.4),
            ("component_criticality", 0.1),
        ])
        .unwrap();

        let plain = configured.for_mode(ScoringMode::Plain).unwrap();
        assert!(!plain.contains(Factor::ComponentCriticality));
        assert!((plain.get(Factor::Variability).unwrap() - 0.5 / 0.9).abs() < 1e-9);
        assert!((sum(&plain) - 1.0).abs() <= WEIGHT_TOLERANCE);

        let aware = configured.for_mode(ScoringMode::ComponentAware).unwrap();
        assert_eq!(aware, configured);

        let flat = FactorWeights::from_named([("variability", 0.6), ("lead_time", 0.4)]).unwrap();
        let aware = flat.for_mode(ScoringMode::ComponentAware).unwrap();
        assert_eq!(aware.get(Factor::ComponentCriticality), Some(0.10));
        assert!((aware.get(Factor::Variability).unwrap() - 0.54).abs() < 1e-9);
        assert_eq!(flat.for_mode(ScoringMode::Plain).unwrap(), flat);
    }

    #[test]
    fn component_only_weights_cannot_score_plain() {
        let only = FactorWeights::from_named([("component_criticality", 1.0)]).unwrap();
        assert!(only.for_mode(ScoringMode::Plain).is_err());
        assert!(only.for_mode(ScoringMode::ComponentAware).is_ok());
    }
}
