use std::collections::BTreeMap;
use std::sync::RwLock;

use ddmrp_core::{DomainError, DomainResult, Entity, ProductLocationPair};
use ddmrp_decoupling::{DecouplingPoint, DecouplingRegistry};

/// In-memory decoupling point registry for tests/dev and snapshot runs.
///
/// A poisoned lock is reported as an invariant violation on every access.
#[derive(Debug, Default)]
pub struct InMemoryDecouplingRegistry {
    inner: RwLock<BTreeMap<ProductLocationPair, DecouplingPoint>>,
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::invariant("decoupling registry lock poisoned")
}

impl InMemoryDecouplingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing designations; later duplicates of a pair are ignored.
    pub fn with_points(points: impl IntoIterator<Item = DecouplingPoint>) -> Self {
        let mut map = BTreeMap::new();
        for point in points {
            map.entry(point.key().clone()).or_insert(point);
        }
        Self {
            inner: RwLock::new(map),
        }
    }

    pub fn len(&self) -> DomainResult<usize> {
        Ok(self.inner.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl DecouplingRegistry for InMemoryDecouplingRegistry {
    fn contains(&self, pair: &ProductLocationPair) -> DomainResult<bool> {
        Ok(self.inner.read().map_err(poisoned)?.contains_key(pair))
    }

    fn get(&self, pair: &ProductLocationPair) -> DomainResult<Option<DecouplingPoint>> {
        Ok(self.inner.read().map_err(poisoned)?.get(pair).cloned())
    }

    fn insert(&self, point: DecouplingPoint) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(poisoned)?;
        if map.contains_key(point.key()) {
            return Err(DomainError::conflict(format!(
                "{} is already a decoupling point",
                point.key()
            )));
        }
        map.insert(point.key().clone(), point);
        Ok(())
    }

    fn list(&self) -> DomainResult<Vec<DecouplingPoint>> {
        Ok(self.inner.read().map_err(poisoned)?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{DateTime, Utc};
    use ddmrp_core::{DecouplingPointId, ErrorKind};
    use ddmrp_decoupling::UpsertOutcome;

    use super::*;

    fn point(product: &str) -> DecouplingPoint {
        DecouplingPoint {
            id: DecouplingPointId::new(),
            pair: ProductLocationPair::parse(product, "WH-1").unwrap(),
            buffer_profile_id: None,
            is_strategic: true,
            designation_reason: "seeded".into(),
            scenario: None,
            score: None,
            designated_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn insert_if_absent_is_idempotent() {
        let registry = InMemoryDecouplingRegistry::new();
        assert_eq!(registry.insert_if_absent(point("A")).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(
            registry.insert_if_absent(point("A")).unwrap(),
            UpsertOutcome::AlreadyPresent
        );
        assert_eq!(registry.len().unwrap(), 1);
        assert!(registry.contains(&point("A").pair).unwrap());
    }

    #[test]
    fn concurrent_writers_insert_once() {
        let registry = Arc::new(InMemoryDecouplingRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = registry.clone();
                thread::spawn(move || r.insert_if_absent(point("RACE")).unwrap())
            })
            .collect();
        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|o| *o == UpsertOutcome::Inserted)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(registry.list().unwrap().len(), 1);
    }

    #[test]
    fn seeding_keeps_first_point_per_pair() {
        let mut dup = point("A");
        dup.designation_reason = "second".into();
        let registry = InMemoryDecouplingRegistry::with_points([point("A"), dup, point("B")]);
        assert_eq!(registry.len().unwrap(), 2);
        assert_eq!(
            registry.get(&point("A").pair).unwrap().unwrap().designation_reason,
            "seeded"
        );
    }

    #[test]
    fn plain_insert_reports_a_conflict() {
        let registry = InMemoryDecouplingRegistry::new();
        registry.insert(point("A")).unwrap();
        let err = registry.insert(point("A")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_recoverable());
    }

    #[test]
    fn poisoned_lock_is_an_error_not_an_empty_registry() {
        let registry = Arc::new(InMemoryDecouplingRegistry::with_points([point("A")]));
        let r = registry.clone();
        let _ = thread::spawn(move || {
            let _guard = r.inner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        let pair = point("A").pair;
        assert_eq!(registry.contains(&pair).unwrap_err().kind(), ErrorKind::InvariantViolation);
        assert!(registry.get(&pair).is_err());
        assert!(registry.list().is_err());
        assert!(registry.len().is_err());
        assert!(registry.insert_if_absent(point("B")).is_err());
    }
}
