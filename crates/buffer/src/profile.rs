//! Buffer profiles: shared, read-only sizing configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ddmrp_core::{DomainError, DomainResult, ValueObject, ensure_non_negative};

/// Identifier of the fallback profile.
pub const DEFAULT_PROFILE_ID: &str = "BP_DEFAULT";

/// Named buffer sizing configuration, shared by many pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub lt_factor: f64,
    pub variability_factor: f64,
    pub order_cycle_days: f64,
    pub min_order_qty: f64,
    pub rounding_multiple: f64,
}

impl ValueObject for BufferProfile {}

impl Default for BufferProfile {
    fn default() -> Self {
        Self {
            id: DEFAULT_PROFILE_ID.to_string(),
            name: "Default".to_string(),
            lt_factor: 1.0,
            variability_factor: 0.5,
            order_cycle_days: 7.0,
            min_order_qty: 0.0,
            rounding_multiple: 1.0,
        }
    }
}

impl BufferProfile {
    pub fn validate(&self) -> DomainResult<()> {
        if self.id.trim().is_empty() {
            return Err(DomainError::invalid_config("buffer profile id cannot be empty"));
        }
        ensure_non_negative("lt_factor", self.lt_factor)?;
        ensure_non_negative("variability_factor", self.variability_factor)?;
        ensure_non_negative("order_cycle_days", self.order_cycle_days)?;
        ensure_non_negative("min_order_qty", self.min_order_qty)?;
        let rounding = ensure_non_negative("rounding_multiple", self.rounding_multiple)?;
        if rounding == 0.0 {
            return Err(DomainError::invalid_config(format!(
                "rounding_multiple of profile {} must be > 0",
                self.id
            )));
        }
        Ok(())
    }
}

/// Lead time bands used for reporting and lead-time criticality scoring.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadTimeCategory {
    Short,
    Medium,
    Long,
}

impl LeadTimeCategory {
    pub fn classify(dlt_days: f64) -> Self {
        if dlt_days <= 7.0 {
            LeadTimeCategory::Short
        } else if dlt_days <= 14.0 {
            LeadTimeCategory::Medium
        } else {
            LeadTimeCategory::Long
        }
    }
}

/// Validated set of profiles with a fallback id.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, BufferProfile>,
    default_id: String,
}

impl ProfileCatalog {
    /// Build a catalog; every profile is validated up front.
    pub fn new(
        profiles: impl IntoIterator<Item = BufferProfile>,
        default_id: impl Into<String>,
    ) -> DomainResult<Self> {
        let mut map = BTreeMap::new();
        for profile in profiles {
            profile.validate()?;
            if map.contains_key(&profile.id) {
                return Err(DomainError::invalid_config(format!(
                    "duplicate buffer profile id {}",
                    profile.id
                )));
            }
            map.insert(profile.id.clone(), profile);
        }
        Ok(Self {
            profiles: map,
            default_id: default_id.into(),
        })
    }

    /// Resolve `id`, falling back to the default profile.
    pub fn resolve(&self, id: Option<&str>) -> DomainResult<&BufferProfile> {
        if let Some(profile) = id.and_then(|id| self.profiles.get(id)) {
            return Ok(profile);
        }
        self.profiles.get(&self.default_id).ok_or_else(DomainError::not_found)
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
