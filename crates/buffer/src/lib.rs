//! Buffer engine module.
//!
//! Sizes DDMRP buffers (red/yellow/green zones), computes the net flow
//! position, classifies buffer status, qualifies demand, and projects the
//! replenishment picture forward day by day. All functions are deterministic
//! and side-effect free, so pairs can be processed in parallel.

pub mod net_flow;
pub mod profile;
pub mod projection;
pub mod purchase_order;
pub mod qualification;
pub mod status;
pub mod zones;

pub use net_flow::{NetFlowSnapshot, net_flow_position};
pub use profile::{DEFAULT_PROFILE_ID, BufferProfile, LeadTimeCategory, ProfileCatalog};
pub use projection::{
    DEFAULT_HORIZON_DAYS, DEFAULT_HORIZON_WEEKS, DayProjection, MAX_HORIZON_DAYS, ProjectionInput,
    ReplenishmentProjection, WeekProjection, order_quantity, project_daily, project_weekly,
    round_up_to_multiple,
};
pub use purchase_order::{OpenPurchaseOrder, PurchaseOrderStatus, ReceiptCalendar, on_order};
pub use qualification::{
    CustomerOrder, OrderQualification, QualificationReason, QualifiedDemand, SpikeParameters,
    qualify_demand,
};
pub use status::{
    BreachSeverity, BreachType, BufferBreach, BufferStatus, PlanningPriority, buffer_penetration,
    classify,
};
pub use zones::{BufferZoneSet, DEFAULT_DLT_DAYS, ZoneInputs};
