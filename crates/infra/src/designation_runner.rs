//! Decoupling designation batch.
//!
//! One run:
//! 1. resolves the scoring mode once from the factor source's capabilities
//! 2. drops candidates that already have a decoupling point
//! 3. takes up to `batch_size` of the rest (the remainder is deferred)
//! 4. scores them on up to `max_concurrent` workers, each lookup bounded by a
//!    timeout and retry policy
//!
//! Per-pair failures are logged and land in the error manifest; they never
//! abort the run.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ddmrp_core::{DomainError, DomainResult, ProductLocationPair, RunId};
use ddmrp_decoupling::{
    CandidateOutcome, Decision, DecouplingRegistry, DecouplingScorer, DesignationContext,
    FactorSource, ScoringMode, ScoringResult, UpsertOutcome, evaluate_candidate,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DesignationConfig;
use crate::error::{ErrorEntry, RunError};
use crate::lookup::BoundedLookup;
use crate::pool::parallel_map;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignationReport {
    pub run_id: RunId,
    pub scenario: String,
    pub mode: ScoringMode,
    pub threshold_used: f64,
    pub review_threshold_used: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Pairs that were scored.
    pub total_analyzed: usize,
    pub auto_designated: usize,
    pub review_required: usize,
    pub auto_rejected: usize,
    /// Auto-designations that lost a race to a concurrent writer.
    pub already_designated: usize,
    pub errored: usize,
    pub skipped_existing: usize,
    pub deferred: usize,
    pub results: Vec<ScoringResult>,
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone)]
pub struct DesignationRunner {
    config: DesignationConfig,
}

impl DesignationRunner {
    pub fn new(config: DesignationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DesignationConfig {
        &self.config
    }

    pub fn run(
        &self,
        candidates: &[ProductLocationPair],
        registry: Arc<dyn DecouplingRegistry>,
        source: Arc<dyn FactorSource>,
        now: DateTime<Utc>,
    ) -> Result<DesignationReport, RunError> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let cfg = &self.config;

        let mode = ScoringMode::resolve(cfg.preferred_mode, source.capabilities());
        let thresholds = cfg.thresholds().map_err(RunError::Configuration)?;
        let weights = cfg.weights_for(mode).map_err(RunError::Configuration)?;
        let scorer =
            DecouplingScorer::new(mode, weights, thresholds).map_err(RunError::Configuration)?;

        info!(
            run_id = %run_id,
            scenario = %cfg.scenario_name,
            mode = %mode,
            candidates = candidates.len(),
            batch_size = cfg.batch_size,
            threshold = thresholds.designate,
            "decoupling designation started"
        );

        let unique: BTreeSet<&ProductLocationPair> = candidates.iter().collect();
        let mut errors = Vec::new();
        let mut skipped_existing = 0;
        let mut pending = Vec::new();
        for pair in unique {
            match registry.contains(pair) {
                Ok(true) => skipped_existing += 1,
                Ok(false) => pending.push(pair.clone()),
                Err(e) => {
                    warn!(pair = %pair, error = %e, "registry check failed");
                    errors.push(ErrorEntry::new(pair.clone(), &e));
                }
            }
        }
        let deferred = pending.len().saturating_sub(cfg.batch_size);
        pending.truncate(cfg.batch_size);

        let ctx = PairScoring {
            lookup: BoundedLookup::new(cfg.lookup_timeout(), cfg.lookup_retry.clone()),
            scorer: &scorer,
            registry: &*registry,
            source: &source,
            mode,
            designation: DesignationContext {
                scenario: &cfg.scenario_name,
                default_profile_id: &cfg.default_profile_id,
                designated_at: now,
            },
        };
        let outcomes = pending
            .iter()
            .cloned()
            .zip(parallel_map(&pending, cfg.max_concurrent, |pair| ctx.score(pair))?)
            .map(|(pair, outcome)| (pair, outcome.map_err(DomainError::from).and_then(|r| r)));

        let mut report = DesignationReport {
            run_id,
            scenario: cfg.scenario_name.clone(),
            mode,
            threshold_used: thresholds.designate,
            review_threshold_used: thresholds.review,
            started_at,
            finished_at: started_at,
            total_analyzed: 0,
            auto_designated: 0,
            review_required: 0,
            auto_rejected: 0,
            already_designated: 0,
            errored: 0,
            skipped_existing,
            deferred,
            results: Vec::new(),
            errors,
        };

        for (pair, outcome) in outcomes {
            match outcome {
                Ok(CandidateOutcome::SkippedExisting) => report.skipped_existing += 1,
                Ok(CandidateOutcome::Scored {
                    result,
                    designation,
                }) => {
                    report.total_analyzed += 1;
                    match result.decision {
                        Decision::AutoDesignate => {
                            if designation == Some(UpsertOutcome::AlreadyPresent) {
                                report.already_designated += 1;
                            } else {
                                report.auto_designated += 1;
                            }
                        }
                        Decision::ManualReview => report.review_required += 1,
                        Decision::AutoReject => report.auto_rejected += 1,
                    }
                    report.results.push(result);
                }
                Err(e) => {
                    warn!(pair = %pair, error = %e, "pair skipped in designation");
                    report.errors.push(ErrorEntry::new(pair, &e));
                }
            }
        }
        report.errored = report.errors.len();
        report.finished_at = Utc::now();

        info!(
            run_id = %run_id,
            analyzed = report.total_analyzed,
            designated = report.auto_designated,
            review = report.review_required,
            rejected = report.auto_rejected,
            errored = report.errored,
            skipped_existing = report.skipped_existing,
            deferred = report.deferred,
            "decoupling designation finished"
        );

        Ok(report)
    }
}

/// Everything one worker needs to score a pair.
struct PairScoring<'a> {
    lookup: BoundedLookup,
    scorer: &'a DecouplingScorer,
    registry: &'a dyn DecouplingRegistry,
    source: &'a Arc<dyn FactorSource>,
    mode: ScoringMode,
    designation: DesignationContext<'a>,
}

impl PairScoring<'_> {
    fn score(&self, pair: &ProductLocationPair) -> DomainResult<CandidateOutcome> {
        let values = self.lookup.fetch(self.source, pair, self.mode)?;
        let outcome = evaluate_candidate(
            self.scorer,
            self.registry,
            pair,
            &values,
            &self.designation,
            || self.lookup.fetch_profile(self.source, pair),
        )?;
        if let CandidateOutcome::Scored { result, .. } = &outcome {
            debug!(pair = %pair, score = result.score, decision = ?result.decision, "pair scored");
        }
        Ok(outcome)
    }
}
