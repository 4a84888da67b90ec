use ddmrp_core::{DomainResult, ensure_finite};
use serde::{Deserialize, Serialize};

use crate::status::{BufferStatus, classify};
use crate::zones::BufferZoneSet;

/// Net flow position: `on_hand + max(0, on_order) - qualified_demand`.
pub fn net_flow_position(on_hand: f64, on_order: f64, qualified_demand: f64) -> f64 {
    on_hand + on_order.max(0.0) - qualified_demand
}

/// Point-in-time NFP for a pair. Derived on every query, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetFlowSnapshot {
    pub on_hand: f64,
    pub on_order: f64,
    pub qualified_demand: f64,
    pub nfp: f64,
    pub status: BufferStatus,
}

impl NetFlowSnapshot {
    pub fn evaluate(
        on_hand: f64,
        on_order: f64,
        qualified_demand: f64,
        zones: &BufferZoneSet,
    ) -> DomainResult<Self> {
        let on_hand = ensure_finite("on_hand", on_hand)?;
        let on_order = ensure_finite("on_order", on_order)?;
        let qualified_demand = ensure_finite("qualified_demand", qualified_demand)?;

        let nfp = net_flow_position(on_hand, on_order, qualified_demand);
        Ok(Self {
            on_hand,
            on_order,
            qualified_demand,
            nfp,
            status: classify(nfp, zones),
        })
    }
}
