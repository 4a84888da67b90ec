//! Deterministic k-fold backtest of the ADU estimate.
//!
//! The daily series is split into `k` contiguous folds. For each fold the ADU
//! is the mean of all other days, and the error is measured against every
//! held-out day.

use serde::{Deserialize, Serialize};

use ddmrp_core::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub fold: usize,
    pub holdout_days: usize,
    pub adu: f64,
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error over non-zero actuals; `None` if all actuals are zero.
    pub mape: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub folds: Vec<FoldMetrics>,
    pub mean_mae: f64,
    pub mean_rmse: f64,
    pub mean_mape: Option<f64>,
}

pub fn backtest_adu(daily_series: &[f64], k: usize) -> DomainResult<BacktestReport> {
    if k < 2 {
        return Err(DomainError::insufficient_data(2, k));
    }
    if daily_series.len() < k {
        return Err(DomainError::insufficient_data(k, daily_series.len()));
    }

    let n = daily_series.len();
    let total: f64 = daily_series.iter().sum();
    let mut folds = Vec::with_capacity(k);

    for fold in 0..k {
        // Spread the remainder over the first folds so sizes differ by at most one.
        let start = fold * n / k;
        let end = (fold + 1) * n / k;
        let holdout = &daily_series[start..end];
        let train_days = n - holdout.len();
        let holdout_sum: f64 = holdout.iter().sum();
        let adu = (total - holdout_sum) / train_days as f64;

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut pct_count = 0usize;
        for actual in holdout {
            let err = actual - adu;
            abs_sum += err.abs();
            sq_sum += err * err;
            if *actual != 0.0 {
                pct_sum += (err / actual).abs() * 100.0;
                pct_count += 1;
            }
        }

        let m = holdout.len() as f64;
        folds.push(FoldMetrics {
            fold,
            holdout_days: holdout.len(),
            adu,
            mae: abs_sum / m,
            rmse: (sq_sum / m).sqrt(),
            mape: (pct_count > 0).then(|| pct_sum / pct_count as f64),
        });
    }

    let kf = k as f64;
    let mapes: Vec<f64> = folds.iter().filter_map(|f| f.mape).collect();
    Ok(BacktestReport {
        mean_mae: folds.iter().map(|f| f.mae).sum::<f64>() / kf,
        mean_rmse: folds.iter().map(|f| f.rmse).sum::<f64>() / kf,
        mean_mape: (!mapes.is_empty()).then(|| mapes.iter().sum::<f64>() / mapes.len() as f64),
        folds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_series_has_zero_error() {
        let report = backtest_adu(&[4.0; 20], 4).unwrap();
        assert_eq!(report.folds.len(), 4);
        assert!(report.folds.iter().all(|f| f.holdout_days == 5));
        assert_eq!(report.mean_mae, 0.0);
        assert_eq!(report.mean_mape, Some(0.0));
    }

    #[test]
    fn folds_cover_every_day_exactly_once() {
        let series: Vec<f64> = (0..23).map(f64::from).collect();
        let report = backtest_adu(&series, 5).unwrap();
        let covered: usize = report.folds.iter().map(|f| f.holdout_days).sum();
        assert_eq!(covered, 23);
    }

    #[test]
    fn holdout_mean_is_computed_from_other_folds() {
        let report = backtest_adu(&[0.0, 0.0, 10.0, 10.0], 2).unwrap();
        assert_eq!(report.folds[0].adu, 10.0);
        assert_eq!(report.folds[1].adu, 0.0);
        assert_eq!(report.folds[0].mae, 10.0);
        assert_eq!(report.folds[0].mape, None);
        assert_eq!(report.folds[1].mape, Some(100.0));
    }

    #[test]
    fn too_few_folds_or_points_is_insufficient() {
        assert!(backtest_adu(&[1.0, 2.0], 1).is_err());
        assert!(backtest_adu(&[1.0, 2.0], 3).is_err());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let series = [3.0, 7.0, 2.0, 9.0, 4.0, 6.0];
        assert_eq!(backtest_adu(&series, 3).unwrap(), backtest_adu(&series, 3).unwrap());
    }
}
