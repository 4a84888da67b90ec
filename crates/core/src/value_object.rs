//! Value object trait: equality by value, not identity.
//!
//! Buffer profiles, zone sets, net-flow snapshots and scoring results are all
//! value objects: derived or configured data with no identity of their own,
//! recomputed on every run rather than mutated in place.

/// Marker trait for value objects.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: no identity (a `BufferZoneSet` with the same thresholds
///   is the same zone set)
/// - **Entity**: has identity (a `DecouplingPoint` is the same designation
///   even if its reason text is rewritten)
///
/// Value objects are immutable; to "change" one, compute a new one. This is
/// what lets per-pair computations run in parallel without locking.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
