//! Buffer status classification, penetration and breach detection.

use serde::{Deserialize, Serialize};

use crate::zones::BufferZoneSet;

/// Buffer health at one evaluation instant.
///
/// Re-evaluated on every call; transitions are never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BufferStatus {
    Red,
    Yellow,
    Green,
    Blue,
}

impl BufferStatus {
    /// Pure classification. Ties go to the safer side.
    pub fn from_thresholds(nfp: f64, tor: f64, toy: f64, tog: f64) -> Self {
        if nfp < tor {
            BufferStatus::Red
        } else if nfp < toy {
            BufferStatus::Yellow
        } else if nfp < tog {
            BufferStatus::Green
        } else {
            BufferStatus::Blue
        }
    }

    /// Urgency rank: RED (4) > YELLOW (3) > GREEN (2) > BLUE (1).
    pub fn urgency(self) -> u8 {
        match self {
            BufferStatus::Red => 4,
            BufferStatus::Yellow => 3,
            BufferStatus::Green => 2,
            BufferStatus::Blue => 1,
        }
    }

    /// Most urgent of two statuses.
    pub fn worst(self, other: Self) -> Self {
        if other.urgency() > self.urgency() { other } else { self }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BufferStatus::Red => "RED",
            BufferStatus::Yellow => "YELLOW",
            BufferStatus::Green => "GREEN",
            BufferStatus::Blue => "BLUE",
        }
    }
}

impl core::fmt::Display for BufferStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `nfp` against a zone set.
pub fn classify(nfp: f64, zones: &BufferZoneSet) -> BufferStatus {
    BufferStatus::from_thresholds(nfp, zones.tor, zones.toy, zones.tog)
}

/// How deep the NFP sits inside the buffer, 0–100 (100 = fully penetrated).
pub fn buffer_penetration(nfp: f64, zones: &BufferZoneSet) -> f64 {
    if zones.tog <= 0.0 {
        return 0.0;
    }
    ((zones.tog - nfp) / zones.tog * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanningPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl PlanningPriority {
    pub fn from_penetration(penetration: f64) -> Self {
        if penetration >= 95.0 {
            PlanningPriority::Critical
        } else if penetration >= 80.0 {
            PlanningPriority::High
        } else if penetration >= 60.0 {
            PlanningPriority::Medium
        } else {
            PlanningPriority::Low
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreachType {
    BelowTor,
    BelowToy,
    AboveTog,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BreachSeverity {
    High,
    Medium,
    Low,
}

/// A threshold crossing worth alerting on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferBreach {
    pub breach_type: BreachType,
    pub severity: BreachSeverity,
    pub nfp: f64,
    pub threshold: f64,
}

impl BufferBreach {
    /// `None` while the NFP sits between TOY and TOG (inclusive).
    pub fn detect(nfp: f64, zones: &BufferZoneSet) -> Option<Self> {
        let (breach_type, severity, threshold) = if nfp < zones.tor {
            (BreachType::BelowTor, BreachSeverity::High, zones.tor)
        } else if nfp < zones.toy {
            (BreachType::BelowToy, BreachSeverity::Medium, zones.toy)
        } else if nfp > zones.tog {
            (BreachType::AboveTog, BreachSeverity::Low, zones.tog)
        } else {
            return None;
        };
        Some(Self {
            breach_type,
            severity,
            nfp,
            threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zones() -> BufferZoneSet {
        BufferZoneSet::from_thresholds(25.0, 95.0, 120.0).unwrap()
    }

    #[test]
    fn boundaries_belong_to_the_safer_side() {
        let z = zones();
        assert_eq!(classify(24.999, &z), BufferStatus::Red);
        assert_eq!(classify(25.0, &z), BufferStatus::Yellow);
        assert_eq!(classify(95.0, &z), BufferStatus::Green);
        assert_eq!(classify(120.0, &z), BufferStatus::Blue);
    }

    #[test]
    fn nfp_forty_is_yellow() {
        assert_eq!(classify(40.0, &zones()), BufferStatus::Yellow);
    }

    #[test]
    fn zero_zones_classify_blue_unless_negative() {
        let z = BufferZoneSet::zero();
        assert_eq!(classify(0.0, &z), BufferStatus::Blue);
        assert_eq!(classify(10.0, &z), BufferStatus::Blue);
        assert_eq!(classify(-1.0, &z), BufferStatus::Red);
    }

    #[test]
    fn worst_picks_most_urgent() {
        assert_eq!(BufferStatus::Blue.worst(BufferStatus::Yellow), BufferStatus::Yellow);
        assert_eq!(BufferStatus::Red.worst(BufferStatus::Green), BufferStatus::Red);
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(BufferStatus::Yellow.to_string(), "YELLOW");
    }

    #[test]
    fn penetration_and_priority() {
        let z = zones();
        assert_eq!(buffer_penetration(120.0, &z), 0.0);
        assert_eq!(buffer_penetration(0.0, &z), 100.0);
        assert_eq!(buffer_penetration(-50.0, &z), 100.0);
        assert!((buffer_penetration(24.0, &z) - 80.0).abs() < 1e-9);
        assert_eq!(buffer_penetration(10.0, &BufferZoneSet::zero()), 0.0);
        assert_eq!(PlanningPriority::from_penetration(96.0), PlanningPriority::Critical);
        assert_eq!(PlanningPriority::from_penetration(80.0), PlanningPriority::High);
        assert_eq!(PlanningPriority::from_penetration(10.0), PlanningPriority::Low);
    }

    #[test]
    fn breach_detection() {
        let z = zones();
        let below_tor = BufferBreach::detect(10.0, &z).unwrap();
        assert_eq!(below_tor.breach_type, BreachType::BelowTor);
        assert_eq!(below_tor.severity, BreachSeverity::High);
        assert_eq!(BufferBreach::detect(50.0, &z).unwrap().breach_type, BreachType::BelowToy);
        assert!(BufferBreach::detect(100.0, &z).is_none());
        assert!(BufferBreach::detect(120.0, &z).is_none());
        assert_eq!(BufferBreach::detect(130.0, &z).unwrap().breach_type, BreachType::AboveTog);
    }

    proptest! {
        #[test]
        fn urgency_never_increases_as_nfp_grows(
            a in -500.0f64..500.0,
            b in -500.0f64..500.0,
            red in 0.0f64..100.0,
            yellow in 0.0f64..100.0,
            green in 0.0f64..100.0,
        ) {
            let z = BufferZoneSet::from_thresholds(red, red + yellow, red + yellow + green).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(lo, &z).urgency() >= classify(hi, &z).urgency());
        }

        #[test]
        fn classification_is_pure(nfp in -500.0f64..500.0, tor in 0.0f64..100.0) {
            let z = BufferZoneSet::from_thresholds(tor, tor * 2.0, tor * 3.0).unwrap();
            prop_assert_eq!(classify(nfp, &z), classify(nfp, &z));
        }
    }
}
