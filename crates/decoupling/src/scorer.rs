//! Weighted multi-factor decoupling scorer.

use ddmrp_core::{DomainError, DomainResult, ProductLocationPair, ValueObject};
use serde::{Deserialize, Serialize};

use crate::factors::{Factor, FactorValues, FactorWeights};

/// Scoring mode, fixed for a whole batch run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    Plain,
    ComponentAware,
}

impl ScoringMode {
    /// Pick the mode for a run from the preferred mode and what the factor
    /// source can actually supply. Resolved once, then passed down.
    pub fn resolve(preferred: ScoringMode, capabilities: ScoringCapabilities) -> Self {
        match preferred {
            ScoringMode::ComponentAware if capabilities.component_criticality => {
                ScoringMode::ComponentAware
            }
            _ => ScoringMode::Plain,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoringMode::Plain => "plain",
            ScoringMode::ComponentAware => "component_aware",
        }
    }
}

impl core::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a factor source can supply.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringCapabilities {
    /// Bill-of-materials data is available for component criticality.
    pub component_criticality: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AutoDesignate,
    ManualReview,
    AutoReject,
}

/// Decision cut-offs on the 0–100 scale.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    pub designate: f64,
    pub review: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            designate: 70.0,
            review: 50.0,
        }
    }
}

impl DecisionThresholds {
    /// Thresholds ≤ 1.0 are read as fractions and scaled by 100.
    pub fn new(designate: f64, review: f64) -> DomainResult<Self> {
        let designate = normalize_threshold("designation threshold", designate)?;
        let review = normalize_threshold("review threshold", review)?;
        if review > designate {
            return Err(DomainError::invalid_config(format!(
                "review threshold {review} exceeds designation threshold {designate}"
            )));
        }
        Ok(Self { designate, review })
    }

    pub fn decide(&self, score: f64) -> Decision {
        if score >= self.designate {
            Decision::AutoDesignate
        } else if score >= self.review {
            Decision::ManualReview
        } else {
            Decision::AutoReject
        }
    }
}

fn normalize_threshold(name: &str, value: f64) -> DomainResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::invalid_config(format!(
            "{name} must be a non-negative number (got {value})"
        )));
    }
    let scaled = if value <= 1.0 { value * 100.0 } else { value };
    if scaled > 100.0 {
        return Err(DomainError::invalid_config(format!(
            "{name} must be within 0-100 (got {value})"
        )));
    }
    Ok(scaled)
}

/// One line of the score breakdown.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: Factor,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub pair: ProductLocationPair,
    pub mode: ScoringMode,
    pub score: f64,
    pub decision: Decision,
    /// Ordered by factor.
    pub breakdown: Vec<FactorContribution>,
}

impl ValueObject for ScoringResult {}

impl ScoringResult {
    /// Human-readable top contributors, used as the designation reason.
    pub fn summary(&self) -> String {
        let mut top: Vec<&FactorContribution> = self.breakdown.iter().collect();
        top.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
        let drivers: Vec<String> = top
            .iter()
            .take(3)
            .map(|c| format!("{} {:.0}", c.factor, c.value))
            .collect();
        format!("score {:.1} ({})", self.score, drivers.join(", "))
    }
}

/// Scores pairs against one weight vector, mode and threshold set.
#[derive(Debug, Clone, PartialEq)]
pub struct DecouplingScorer {
    mode: ScoringMode,
    weights: FactorWeights,
    thresholds: DecisionThresholds,
}

impl DecouplingScorer {
    /// The weight vector must match the mode: component criticality is
    /// weighted in component-aware mode and only there.
    pub fn new(
        mode: ScoringMode,
        weights: FactorWeights,
        thresholds: DecisionThresholds,
    ) -> DomainResult<Self> {
        let has_component = weights
            .get(Factor::ComponentCriticality)
            .is_some_and(|w| w > 0.0);
        match (mode, has_component) {
            (ScoringMode::Plain, true) => Err(DomainError::invalid_config(
                "plain scoring mode cannot weight component criticality",
            )),
            (ScoringMode::ComponentAware, false) => Err(DomainError::invalid_config(
                "component-aware scoring mode requires a component criticality weight",
            )),
            _ => Ok(Self {
                mode,
                weights,
                thresholds,
            }),
        }
    }

    pub fn with_defaults(mode: ScoringMode) -> Self {
        Self {
            mode,
            weights: FactorWeights::default_for(mode),
            thresholds: DecisionThresholds::default(),
        }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    pub fn thresholds(&self) -> DecisionThresholds {
        self.thresholds
    }

    pub fn weights(&self) -> &FactorWeights {
        &self.weights
    }

    /// Weighted sum of the pair's factor values.
    ///
    /// Missing weighted factors are `InsufficientData`; values outside 0–100
    /// are `InvalidConfiguration`. Factors present in `values` but not
    /// weighted are ignored.
    pub fn score(
        &self,
        pair: &ProductLocationPair,
        values: &FactorValues,
    ) -> DomainResult<ScoringResult> {
        let missing = self
            .weights
            .iter()
            .filter(|(f, _)| values.get(*f).is_none())
            .count();
        if missing > 0 {
            return Err(DomainError::insufficient_data(
                self.weights.len(),
                self.weights.len() - missing,
            ));
        }

        let mut breakdown = Vec::with_capacity(self.weights.len());
        for (factor, weight) in self.weights.iter() {
            let value = values.get(factor).unwrap_or_default();
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(DomainError::invalid_config(format!(
                    "{factor} score for {pair} must be within 0-100 (got {value})"
                )));
            }
            breakdown.push(FactorContribution {
                factor,
                value,
                weight,
                contribution: value * weight,
            });
        }

        let score = breakdown
            .iter()
            .map(|c| c.contribution)
            .sum::<f64>()
            .clamp(0.0, 100.0);

        Ok(ScoringResult {
            pair: pair.clone(),
            mode: self.mode,
            score,
            decision: self.thresholds.decide(score),
            breakdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pair() -> ProductLocationPair {
        ProductLocationPair::parse("SKU-1", "WH-1").unwrap()
    }

    fn uniform(value: f64) -> FactorValues {
        Factor::ALL.into_iter().map(|f| (f, value)).collect()
    }

    #[test]
    fn uniform_values_score_that_value() {
        let scorer = DecouplingScorer::with_defaults(ScoringMode::Plain);
        let result = scorer.score(&pair(), &uniform(80.0)).unwrap();

        assert!((result.score - 80.0).abs() < 1e-9);
        assert_eq!(result.decision, Decision::AutoDesignate);
        assert_eq!(result.breakdown.len(), 9);
    }

    #[test]
    fn decision_buckets() {
        let t = DecisionThresholds::default();
        assert_eq!(t.decide(70.0), Decision::AutoDesignate);
        assert_eq!(t.decide(69.9), Decision::ManualReview);
        assert_eq!(t.decide(50.0), Decision::ManualReview);
        assert_eq!(t.decide(49.9), Decision::AutoReject);
    }

    #[test]
    fn fractional_thresholds_are_normalized() {
        let t = DecisionThresholds::new(0.75, 0.5).unwrap();
        assert_eq!(t.designate, 75.0);
        assert_eq!(t.review, 50.0);
        assert_eq!(DecisionThresholds::new(80.0, 50.0).unwrap().designate, 80.0);
    }

    #[test]
    fn rejects_inverted_or_out_of_range_thresholds() {
        assert!(DecisionThresholds::new(40.0, 60.0).is_err());
        assert!(DecisionThresholds::new(150.0, 50.0).is_err());
        assert!(DecisionThresholds::new(-1.0, 0.0).is_err());
    }

    #[test]
    fn missing_factor_is_insufficient_data() {
        let scorer = DecouplingScorer::with_defaults(ScoringMode::Plain);
        let values = FactorValues::new().with(Factor::Variability, 50.0);

        let err = scorer.score(&pair(), &values).unwrap_err();
        assert_eq!(err, DomainError::insufficient_data(9, 1));
    }

    #[test]
    fn out_of_range_value_is_invalid() {
        let scorer = DecouplingScorer::with_defaults(ScoringMode::Plain);
        let values = uniform(50.0).with(Factor::LeadTime, 140.0);
        assert!(matches!(
            scorer.score(&pair(), &values),
            Err(DomainError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn mode_resolution_falls_back_to_plain() {
        let none = ScoringCapabilities::default();
        let bom = ScoringCapabilities {
            component_criticality: true,
        };
        assert_eq!(ScoringMode::resolve(ScoringMode::ComponentAware, none), ScoringMode::Plain);
        assert_eq!(
            ScoringMode::resolve(ScoringMode::ComponentAware, bom),
            ScoringMode::ComponentAware
        );
        assert_eq!(ScoringMode::resolve(ScoringMode::Plain, bom), ScoringMode::Plain);
    }

    #[test]
    fn weights_must_match_mode() {
        let aware = FactorWeights::default_for(ScoringMode::ComponentAware);
        let plain = FactorWeights::default_for(ScoringMode::Plain);
        let t = DecisionThresholds::default();
        assert!(DecouplingScorer::new(ScoringMode::Plain, aware.clone(), t).is_err());
        assert!(DecouplingScorer::new(ScoringMode::ComponentAware, plain, t).is_err());
        assert!(DecouplingScorer::new(ScoringMode::ComponentAware, aware, t).is_ok());
    }

    #[test]
    fn component_criticality_moves_the_score() {
        let scorer = DecouplingScorer::with_defaults(ScoringMode::ComponentAware);
        let low = scorer.score(&pair(), &uniform(60.0).with(Factor::ComponentCriticality, 0.0));
        let high = scorer.score(&pair(), &uniform(60.0).with(Factor::ComponentCriticality, 100.0));
        assert!(high.unwrap().score > low.unwrap().score);
    }

    #[test]
    fn summary_names_top_drivers() {
        let scorer = DecouplingScorer::with_defaults(ScoringMode::Plain);
        let values = uniform(10.0).with(Factor::Variability, 100.0);
        let summary = scorer.score(&pair(), &values).unwrap().summary();
        assert!(summary.contains("variability 100"), "{summary}");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn scoring_is_idempotent_and_bounded(values in proptest::collection::vec(0.0f64..=100.0, 10)) {
            let table: FactorValues = Factor::ALL.into_iter().zip(values).collect();
            for mode in [ScoringMode::Plain, ScoringMode::ComponentAware] {
                let scorer = DecouplingScorer::with_defaults(mode);
                let first = scorer.score(&pair(), &table).unwrap();
                let second = scorer.score(&pair(), &table).unwrap();

                prop_assert!((first.score - second.score).abs() < 1e-12);
                prop_assert_eq!(first.decision, second.decision);
                prop_assert!((0.0..=100.0).contains(&first.score));
            }
        }
    }
}
