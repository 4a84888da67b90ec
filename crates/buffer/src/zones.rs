//! Buffer zone calculator.
//!
//! ```text
//! red    = max(adu × dlt × lt_factor × variability_factor, moq)
//! yellow = adu × order_cycle_days
//! green  = max(red × 0.5, adu × dlt × 0.5)
//! tor = red, toy = red + yellow, tog = red + yellow + green
//! ```

use serde::{Deserialize, Serialize};

use ddmrp_core::{DomainError, DomainResult, ValueObject, ensure_non_negative};

use crate::profile::BufferProfile;

/// Decoupled lead time used when a pair has no known lead time.
pub const DEFAULT_DLT_DAYS: f64 = 7.0;

/// Inputs of the zone calculation for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInputs {
    pub adu: f64,
    /// Decoupled lead time in days; `None` falls back to [`DEFAULT_DLT_DAYS`].
    pub dlt_days: Option<f64>,
    pub lt_factor: f64,
    pub variability_factor: f64,
    pub order_cycle_days: f64,
    pub moq: f64,
}

impl ZoneInputs {
    pub fn from_profile(adu: f64, dlt_days: Option<f64>, profile: &BufferProfile) -> Self {
        Self {
            adu,
            dlt_days,
            lt_factor: profile.lt_factor,
            variability_factor: profile.variability_factor,
            order_cycle_days: profile.order_cycle_days,
            moq: profile.min_order_qty,
        }
    }

    pub fn effective_dlt(&self) -> f64 {
        self.dlt_days.unwrap_or(DEFAULT_DLT_DAYS)
    }
}

/// Red/yellow/green sizes and their cumulative thresholds.
///
/// Invariant: `0 <= tor <= toy <= tog`. Derived data: recompute whenever ADU,
/// DLT or the profile changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferZoneSet {
    pub red: f64,
    pub yellow: f64,
    pub green: f64,
    pub tor: f64,
    pub toy: f64,
    pub tog: f64,
}

impl ValueObject for BufferZoneSet {}

impl BufferZoneSet {
    /// All-zero zones: no meaningful buffer. Any non-negative NFP classifies BLUE.
    pub fn zero() -> Self {
        Self {
            red: 0.0,
            yellow: 0.0,
            green: 0.0,
            tor: 0.0,
            toy: 0.0,
            tog: 0.0,
        }
    }

    /// Size the zones. Negative or non-finite inputs are configuration errors.
    pub fn calculate(inputs: &ZoneInputs) -> DomainResult<Self> {
        let adu = ensure_non_negative("adu", inputs.adu)?;
        let dlt = ensure_non_negative("dlt", inputs.effective_dlt())?;
        let lt_factor = ensure_non_negative("lt_factor", inputs.lt_factor)?;
        let variability_factor = ensure_non_negative("variability_factor", inputs.variability_factor)?;
        let order_cycle_days = ensure_non_negative("order_cycle_days", inputs.order_cycle_days)?;
        let moq = ensure_non_negative("moq", inputs.moq)?;

        if adu == 0.0 {
            return Ok(Self::zero());
        }

        let red = (adu * dlt * lt_factor * variability_factor).max(moq);
        let yellow = adu * order_cycle_days;
        let green = (red * 0.5).max(adu * dlt * 0.5);

        Ok(Self::from_sizes(red, yellow, green))
    }

    fn from_sizes(red: f64, yellow: f64, green: f64) -> Self {
        let tor = red;
        let toy = tor + yellow;
        let tog = toy + green;
        Self {
            red,
            yellow,
            green,
            tor,
            toy,
            tog,
        }
    }

    /// Rebuild a zone set from stored thresholds, checking their ordering.
    pub fn from_thresholds(tor: f64, toy: f64, tog: f64) -> DomainResult<Self> {
        let tor = ensure_non_negative("tor", tor)?;
        let toy = ensure_non_negative("toy", toy)?;
        let tog = ensure_non_negative("tog", tog)?;
        if !(tor <= toy && toy <= tog) {
            return Err(DomainError::invalid_config(format!(
                "zone thresholds out of order: tor={tor}, toy={toy}, tog={tog}"
            )));
        }
        Ok(Self {
            red: tor,
            yellow: toy - tor,
            green: tog - toy,
            tor,
            toy,
            tog,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.tog == 0.0
    }

    pub fn is_ordered(&self) -> bool {
        0.0 <= self.tor && self.tor <= self.toy && self.toy <= self.tog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(adu: f64, dlt: f64) -> ZoneInputs {
        ZoneInputs {
            adu,
            dlt_days: Some(dlt),
            lt_factor: 1.0,
            variability_factor: 0.5,
            order_cycle_days: 7.0,
            moq: 0.0,
        }
    }

    #[test]
    fn reference_sizing() {
        let zones = BufferZoneSet::calculate(&inputs(10.0, 5.0)).unwrap();
        assert_eq!(zones.red, 25.0);
        assert_eq!(zones.yellow, 70.0);
        assert_eq!(zones.green, 25.0);
        assert_eq!(zones.tor, 25.0);
        assert_eq!(zones.toy, 95.0);
        assert_eq!(zones.tog, 120.0);
    }

    #[test]
    fn red_zone_never_below_moq() {
        let zones = BufferZoneSet::calculate(&ZoneInputs {
            moq: 100.0,
            ..inputs(10.0, 5.0)
        })
        .unwrap();
        assert_eq!(zones.red, 100.0);
        assert_eq!(zones.green, 50.0);
        assert_eq!(zones.tog, 220.0);
    }

    #[test]
    fn missing_dlt_defaults_to_seven_days() {
        let zones = BufferZoneSet::calculate(&ZoneInputs {
            dlt_days: None,
            ..inputs(2.0, 0.0)
        })
        .unwrap();
        assert_eq!(zones.red, 7.0);
    }

    #[test]
    fn zero_adu_yields_zero_zones() {
        let zones = BufferZoneSet::calculate(&ZoneInputs {
            moq: 50.0,
            ..inputs(0.0, 5.0)
        })
        .unwrap();
        assert!(zones.is_zero());
        assert_eq!(zones, BufferZoneSet::zero());
    }

    #[test]
    fn negative_adu_and_lead_time_are_rejected() {
        assert!(matches!(
            BufferZoneSet::calculate(&inputs(-1.0, 5.0)),
            Err(DomainError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BufferZoneSet::calculate(&inputs(1.0, -5.0)),
            Err(DomainError::InvalidConfiguration(_))
        ));
        assert!(BufferZoneSet::calculate(&inputs(f64::NAN, 5.0)).is_err());
    }

    #[test]
    fn thresholds_must_be_ordered() {
        assert!(BufferZoneSet::from_thresholds(25.0, 95.0, 120.0).is_ok());
        assert!(BufferZoneSet::from_thresholds(25.0, 20.0, 120.0).is_err());
        let z = BufferZoneSet::from_thresholds(25.0, 95.0, 120.0).unwrap();
        assert_eq!(z.yellow, 70.0);
        assert_eq!(z.green, 25.0);
    }

    proptest! {
        #[test]
        fn zones_are_ordered_for_non_negative_inputs(
            adu in 0.0f64..10_000.0,
            dlt in 0.0f64..120.0,
            lt in 0.0f64..3.0,
            var in 0.0f64..2.0,
            cycle in 0.0f64..60.0,
            moq in 0.0f64..5_000.0,
        ) {
            let zones = BufferZoneSet::calculate(&ZoneInputs {
                adu,
                dlt_days: Some(dlt),
                lt_factor: lt,
                variability_factor: var,
                order_cycle_days: cycle,
                moq,
            }).unwrap();
            prop_assert!(zones.is_ordered());
            if adu > 0.0 {
                prop_assert!(zones.red >= moq);
            }
        }
    }
}
