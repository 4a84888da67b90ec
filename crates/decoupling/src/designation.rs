//! Designation records and the seams to storage and factor data.

use chrono::{DateTime, Utc};
use ddmrp_core::{DecouplingPointId, DomainError, DomainResult, Entity, ProductLocationPair};
use serde::{Deserialize, Serialize};

use crate::factors::FactorValues;
use crate::scorer::{Decision, DecouplingScorer, ScoringCapabilities, ScoringMode, ScoringResult};

/// A product/location pair designated as a strategic buffer position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecouplingPoint {
    pub id: DecouplingPointId,
    #[serde(flatten)]
    pub pair: ProductLocationPair,
    #[serde(default)]
    pub buffer_profile_id: Option<String>,
    pub is_strategic: bool,
    pub designation_reason: String,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    pub designated_at: DateTime<Utc>,
}

impl Entity for DecouplingPoint {
    type Id = DecouplingPointId;
    type Key = ProductLocationPair;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn key(&self) -> &Self::Key {
        &self.pair
    }
}

impl DecouplingPoint {
    /// Designation produced by an auto-designate scoring decision.
    pub fn from_scoring(
        result: &ScoringResult,
        buffer_profile_id: Option<String>,
        scenario: &str,
        designated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DecouplingPointId::new(),
            pair: result.pair.clone(),
            buffer_profile_id,
            is_strategic: true,
            designation_reason: format!("auto-designated: {}", result.summary()),
            scenario: Some(scenario.to_string()),
            score: Some(result.score),
            designated_at,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Store of active decoupling points.
///
/// `insert` must be atomic per pair and answer [`DomainError::Conflict`] when
/// the pair is already designated, so that two racing writers see exactly one
/// success.
pub trait DecouplingRegistry: Send + Sync {
    fn contains(&self, pair: &ProductLocationPair) -> DomainResult<bool>;

    fn get(&self, pair: &ProductLocationPair) -> DomainResult<Option<DecouplingPoint>>;

    fn insert(&self, point: DecouplingPoint) -> DomainResult<()>;

    fn list(&self) -> DomainResult<Vec<DecouplingPoint>>;

    /// Upsert-if-absent: a conflict on insert is the expected no-op.
    fn insert_if_absent(&self, point: DecouplingPoint) -> DomainResult<UpsertOutcome> {
        match self.insert(point) {
            Ok(()) => Ok(UpsertOutcome::Inserted),
            Err(DomainError::Conflict(_)) => Ok(UpsertOutcome::AlreadyPresent),
            Err(e) => Err(e),
        }
    }
}

/// Supplier of per-pair factor values (possibly remote, possibly slow).
pub trait FactorSource: Send + Sync {
    fn capabilities(&self) -> ScoringCapabilities;

    fn factor_values(&self, pair: &ProductLocationPair, mode: ScoringMode)
    -> DomainResult<FactorValues>;

    /// Buffer profile assigned to the pair's item master, if any.
    fn buffer_profile_id(&self, _pair: &ProductLocationPair) -> DomainResult<Option<String>> {
        Ok(None)
    }
}

/// Run-wide settings stamped on every designation.
#[derive(Debug, Clone, Copy)]
pub struct DesignationContext<'a> {
    pub scenario: &'a str,
    /// Profile bound when the item master carries none.
    pub default_profile_id: &'a str,
    pub designated_at: DateTime<Utc>,
}

/// Result of evaluating one candidate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// The pair already had an active decoupling point; nothing was scored.
    SkippedExisting,
    Scored {
        result: ScoringResult,
        /// Set when the decision was auto-designate.
        designation: Option<UpsertOutcome>,
    },
}

/// Score one candidate and, on auto-designate, write it with upsert-if-absent.
///
/// The existence check runs right before scoring; a concurrent writer that
/// wins the race turns this write into `AlreadyPresent`, never a duplicate.
/// `profile_for` is consulted only when the pair is designated.
pub fn evaluate_candidate(
    scorer: &DecouplingScorer,
    registry: &dyn DecouplingRegistry,
    pair: &ProductLocationPair,
    values: &FactorValues,
    ctx: &DesignationContext<'_>,
    profile_for: impl FnOnce() -> DomainResult<Option<String>>,
) -> DomainResult<CandidateOutcome> {
    if registry.contains(pair)? {
        return Ok(CandidateOutcome::SkippedExisting);
    }

    let result = scorer.score(pair, values)?;
    let designation = if result.decision == Decision::AutoDesignate {
        let profile = profile_for()?.unwrap_or_else(|| ctx.default_profile_id.to_string());
        let point =
            DecouplingPoint::from_scoring(&result, Some(profile), ctx.scenario, ctx.designated_at);
        Some(registry.insert_if_absent(point)?)
    } else {
        None
    };

    Ok(CandidateOutcome::Scored {
        result,
        designation,
    })
}
