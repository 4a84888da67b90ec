//! Rolling demand statistics.
//!
//! Model:
//! - mean and population standard deviation over the window's quantities
//! - coefficient of variation `cv = std_dev / mean` (0 when mean is 0)
//! - piecewise variability score (see [`VariabilityScale`])

use serde::{Deserialize, Serialize};

use ddmrp_core::{DomainError, DomainResult, ValueObject};

/// Minimum number of observations for a confident standard deviation.
pub const MIN_SAMPLES: usize = 2;

/// Piecewise mapping from CV to a 0–100 variability score.
///
/// - `cv < low_cv` → `low_score`
/// - `low_cv <= cv < high_cv` → linear between `low_score` and `high_score`
/// - `cv >= high_cv` → `high_score + (cv - high_cv) * slope_above`, capped at 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariabilityScale {
    pub low_cv: f64,
    pub high_cv: f64,
    pub low_score: f64,
    pub high_score: f64,
    pub slope_above: f64,
}

impl Default for VariabilityScale {
    fn default() -> Self {
        Self {
            low_cv: 0.2,
            high_cv: 0.5,
            low_score: 20.0,
            high_score: 80.0,
            slope_above: 40.0,
        }
    }
}

impl VariabilityScale {
    pub fn score(&self, cv: f64) -> f64 {
        if !cv.is_finite() || cv < self.low_cv {
            return self.low_score;
        }
        if cv < self.high_cv {
            let t = (cv - self.low_cv) / (self.high_cv - self.low_cv);
            return self.low_score + t * (self.high_score - self.low_score);
        }
        (self.high_score + (cv - self.high_cv) * self.slope_above).min(100.0)
    }
}

/// Demand statistics for one pair over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandStatistics {
    /// Number of observations the statistics were computed from.
    pub sample_count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub cv: f64,
    pub variability_score: f64,
}

impl ValueObject for DemandStatistics {}

impl DemandStatistics {
    /// Zeroed, low-confidence statistics for windows with too little data.
    pub fn insufficient(sample_count: usize) -> Self {
        Self {
            sample_count,
            mean: 0.0,
            std_dev: 0.0,
            cv: 0.0,
            variability_score: 0.0,
        }
    }

    /// Compute statistics with the default variability scale.
    ///
    /// Never fails: fewer than [`MIN_SAMPLES`] observations yield
    /// [`DemandStatistics::insufficient`]; check [`Self::is_sufficient`].
    pub fn compute(quantities: &[f64]) -> Self {
        Self::compute_with(quantities, &VariabilityScale::default())
    }

    pub fn compute_with(quantities: &[f64], scale: &VariabilityScale) -> Self {
        let n = quantities.len();
        if n < MIN_SAMPLES {
            return Self::insufficient(n);
        }

        let mean = quantities.iter().sum::<f64>() / n as f64;
        let variance = quantities
            .iter()
            .map(|q| {
                let d = q - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;
        let std_dev = variance.sqrt();
        let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };

        Self {
            sample_count: n,
            mean,
            std_dev,
            cv,
            variability_score: scale.score(cv),
        }
    }

    /// Strict variant for callers that must not proceed on thin history.
    pub fn try_compute(quantities: &[f64]) -> DomainResult<Self> {
        if quantities.len() < MIN_SAMPLES {
            return Err(DomainError::insufficient_data(MIN_SAMPLES, quantities.len()));
        }
        Ok(Self::compute(quantities))
    }

    pub fn is_sufficient(&self) -> bool {
        self.sample_count >= MIN_SAMPLES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn constant_demand_has_zero_cv_and_low_score() {
        let stats = DemandStatistics::compute(&[10.0, 10.0, 10.0, 10.0]);
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.cv, 0.0);
        assert_eq!(stats.variability_score, 20.0);
        assert!(stats.is_sufficient());
    }

    #[test]
    fn zero_mean_does_not_divide_by_zero() {
        let stats = DemandStatistics::compute(&[0.0, 0.0, 0.0]);
        assert_eq!(stats.cv, 0.0);
        assert!(stats.cv.is_finite());
    }

    #[test]
    fn single_point_is_insufficient_not_an_error() {
        let stats = DemandStatistics::compute(&[42.0]);
        assert!(!stats.is_sufficient());
        assert_eq!(stats.sample_count, 1);
        assert_eq!(stats.mean, 0.0);
        assert!(matches!(
            DemandStatistics::try_compute(&[42.0]),
            Err(DomainError::InsufficientData { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn population_std_dev() {
        // mean 5, deviations ±3 → variance 9 → std 3
        let stats = DemandStatistics::compute(&[2.0, 8.0]);
        assert!((stats.std_dev - 3.0).abs() < 1e-12);
        assert!((stats.cv - 0.6).abs() < 1e-12);
        assert!((stats.variability_score - 84.0).abs() < 1e-9);
    }

    #[test]
    fn mid_range_is_linear() {
        let scale = VariabilityScale::default();
        assert!((scale.score(0.2) - 20.0).abs() < 1e-9);
        assert!((scale.score(0.35) - 50.0).abs() < 1e-9);
        assert!((scale.score(0.5) - 80.0).abs() < 1e-9);
        assert_eq!(scale.score(5.0), 100.0);
    }

    proptest! {
        #[test]
        fn score_is_bounded_and_monotone(a in 0.0f64..5.0, b in 0.0f64..5.0) {
            let scale = VariabilityScale::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let s_lo = scale.score(lo);
            let s_hi = scale.score(hi);
            prop_assert!((0.0..=100.0).contains(&s_lo));
            prop_assert!(s_lo <= s_hi + 1e-12);
        }
    }
}
