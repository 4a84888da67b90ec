//! Planning error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the planning engine.
pub type DomainResult<T> = Result<T, DomainError>;

/// Engine-level error.
///
/// Every per-pair computation reports failures through this type. Batch
/// runners turn these into manifest entries; none of them aborts a batch on
/// its own.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Not enough history to compute a statistic with confidence.
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Configuration that would produce an invalid buffer or score
    /// (negative ADU, overlapping DAF ranges, weights not summing to 1, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A single input record failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A lifecycle invariant was violated (e.g. receiving a closed PO).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The target already exists (e.g. the pair is already a decoupling point).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An external score/lookup dependency failed or timed out.
    #[error("external lookup failed: {0}")]
    ExternalLookup(String),

    #[error("not found")]
    NotFound,
}

/// Serializable discriminant of [`DomainError`], used in error manifests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    InvalidConfiguration,
    Validation,
    InvariantViolation,
    Conflict,
    ExternalLookup,
    NotFound,
}

impl DomainError {
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalLookup(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InsufficientData { .. } => ErrorKind::InsufficientData,
            DomainError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::ExternalLookup(_) => ErrorKind::ExternalLookup,
            DomainError::NotFound => ErrorKind::NotFound,
        }
    }

    /// Recoverable errors have a defined fallback (default statistics,
    /// no-op designation, skip-and-retry-next-run).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DomainError::InsufficientData { .. }
                | DomainError::Conflict(_)
                | DomainError::ExternalLookup(_)
        )
    }
}

/// Reject NaN/infinite inputs with a field-named configuration error.
pub fn ensure_finite(field: &str, value: f64) -> DomainResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::invalid_config(format!("{field} must be finite (got {value})")))
    }
}

/// Reject negative or non-finite inputs.
pub fn ensure_non_negative(field: &str, value: f64) -> DomainResult<f64> {
    let value = ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(DomainError::invalid_config(format!(
            "{field} must be >= 0 (got {value})"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            DomainError::insufficient_data(2, 1).kind(),
            ErrorKind::InsufficientData
        );
        assert_eq!(DomainError::conflict("x").kind(), ErrorKind::Conflict);
        assert_eq!(DomainError::not_found().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn configuration_errors_are_not_recoverable() {
        assert!(!DomainError::invalid_config("negative adu").is_recoverable());
        assert!(DomainError::external("timeout").is_recoverable());
        assert!(DomainError::insufficient_data(2, 0).is_recoverable());
    }

    #[test]
    fn non_negative_guard() {
        assert_eq!(ensure_non_negative("adu", 0.0).unwrap(), 0.0);
        assert!(ensure_non_negative("adu", -1.0).is_err());
        assert!(ensure_non_negative("adu", f64::NAN).is_err());
        assert!(ensure_finite("dlt", f64::INFINITY).is_err());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ExternalLookup).unwrap();
        assert_eq!(json, "\"external_lookup\"");
    }
}
