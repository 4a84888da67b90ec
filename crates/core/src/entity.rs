//! Entities: records with a stable identity that outlive a single run.

/// An entity carries a surrogate id plus the business key it is unique on.
///
/// Two entities with the same key describe the same real-world thing even if
/// their ids differ (e.g. two designations of one product/location pair
/// racing each other); stores dedupe on the key.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Business key: at most one entity per key in a store.
    type Key: Clone + Ord + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    fn key(&self) -> &Self::Key;

    fn same_key(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
