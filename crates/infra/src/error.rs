//! Whole-run failures and the per-pair error manifest.

use ddmrp_core::{DomainError, ErrorKind, ProductLocationPair};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure that aborts a whole batch run.
///
/// Per-pair problems never surface here; they go to the run's error manifest.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid run configuration: {0}")]
    Configuration(DomainError),

    #[error("cannot load buffer profiles: {0}")]
    ProfileCatalog(DomainError),

    #[error("decoupling registry unavailable: {0}")]
    Registry(DomainError),

    #[error("worker thread panicked")]
    WorkerPanicked,
}

/// One manifest line for a pair that was skipped because of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub pair: ProductLocationPair,
    pub kind: ErrorKind,
    pub recoverable: bool,
    pub message: String,
}

impl ErrorEntry {
    pub fn new(pair: ProductLocationPair, error: &DomainError) -> Self {
        Self {
            pair,
            kind: error.kind(),
            recoverable: error.is_recoverable(),
            message: error.to_string(),
        }
    }
}
