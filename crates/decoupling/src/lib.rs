//! Decoupling point module.
//!
//! Scores candidate product/location pairs on a declarative factor table and
//! decides whether each should become a strategic decoupling point. Storage
//! of designations and the origin of factor values are traits implemented by
//! the infrastructure layer.

pub mod designation;
pub mod factors;
pub mod scorer;
pub mod signals;

pub use designation::{
    CandidateOutcome, DecouplingPoint, DecouplingRegistry, DesignationContext, FactorSource,
    UpsertOutcome, evaluate_candidate,
};
pub use factors::{Factor, FactorValues, FactorWeights, WEIGHT_TOLERANCE};
pub use scorer::{
    Decision, DecisionThresholds, DecouplingScorer, FactorContribution, ScoringCapabilities,
    ScoringMode, ScoringResult,
};
pub use signals::FactorSignals;
