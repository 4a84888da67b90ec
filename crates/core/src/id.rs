//! Strongly-typed identifiers used across the engine.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a product (external master data key, e.g. a SKU code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

/// Identifier of a stocking location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationId(String);

/// Identifier of a decoupling point designation record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecouplingPointId(Uuid);

/// Identifier of a single batch run (used to correlate logs and reports).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build an identifier, rejecting blank keys.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::validation(concat!($name, " cannot be empty")));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::validation(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_string_newtype!(ProductId, "ProductId");
impl_string_newtype!(LocationId, "LocationId");
impl_uuid_newtype!(DecouplingPointId, "DecouplingPointId");
impl_uuid_newtype!(RunId, "RunId");

/// The unit of analysis: one product stocked at one location.
///
/// Identity is immutable; statistics are recomputed per run and never stored
/// on the pair itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductLocationPair {
    pub product_id: ProductId,
    pub location_id: LocationId,
}

impl ProductLocationPair {
    pub fn new(product_id: ProductId, location_id: LocationId) -> Self {
        Self {
            product_id,
            location_id,
        }
    }

    /// Convenience constructor from raw keys.
    pub fn parse(product_id: &str, location_id: &str) -> Result<Self, DomainError> {
        Ok(Self::new(product_id.parse()?, location_id.parse()?))
    }
}

impl core::fmt::Display for ProductLocationPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.product_id, self.location_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_product_id_is_rejected() {
        assert!(ProductId::new("  ").is_err());
        assert!("".parse::<LocationId>().is_err());
    }

    #[test]
    fn pair_display_joins_product_and_location() {
        let pair = ProductLocationPair::parse("SKU-1", "DC-EAST").unwrap();
        assert_eq!(pair.to_string(), "SKU-1@DC-EAST");
    }

    #[test]
    fn pair_serializes_with_plain_string_ids() {
        let pair = ProductLocationPair::parse("SKU-1", "DC-EAST").unwrap();
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["product_id"], "SKU-1");
        assert_eq!(json["location_id"], "DC-EAST");
    }

    #[test]
    fn blank_ids_are_rejected_when_deserializing() {
        let err = serde_json::from_str::<ProductLocationPair>(
            r#"{"product_id": "", "location_id": "DC-EAST"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
        assert!(serde_json::from_str::<LocationId>(r#""   ""#).is_err());

        let pair: ProductLocationPair =
            serde_json::from_str(r#"{"product_id": "SKU-1", "location_id": "DC-EAST"}"#).unwrap();
        assert_eq!(pair.product_id.as_str(), "SKU-1");
    }

    #[test]
    fn run_id_round_trips_through_display() {
        let id = RunId::new();
        let parsed: RunId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
