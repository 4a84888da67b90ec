//! Bounded fan-out over scoped worker threads.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use ddmrp_core::DomainError;

use crate::error::RunError;

/// A panic raised while processing a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPanic(pub String);

impl ItemPanic {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self(message)
    }
}

impl From<ItemPanic> for DomainError {
    fn from(panic: ItemPanic) -> Self {
        DomainError::invariant(format!("computation panicked: {}", panic.0))
    }
}

/// Apply `f` to every item on at most `workers` threads, preserving order.
///
/// Items are split into contiguous slices, one per worker. A panic inside `f`
/// is caught per item and returned in that item's slot, so the remaining
/// items still run.
pub fn parallel_map<T, R, F>(
    items: &[T],
    workers: usize,
    f: F,
) -> Result<Vec<Result<R, ItemPanic>>, RunError>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let guarded = |item: &T| {
        panic::catch_unwind(AssertUnwindSafe(|| f(item))).map_err(ItemPanic::from_payload)
    };
    let workers = workers.clamp(1, items.len());
    if workers == 1 {
        return Ok(items.iter().map(guarded).collect());
    }

    let slice_len = items.len().div_ceil(workers);
    let guarded = &guarded;
    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(slice_len)
            .map(|slice| scope.spawn(move || slice.iter().map(guarded).collect::<Vec<_>>()))
            .collect();

        // Join every worker before reporting so no panic escapes the scope.
        let joined: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
        let mut out = Vec::with_capacity(items.len());
        for result in joined {
            out.extend(result.map_err(|_| RunError::WorkerPanicked)?);
        }
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled<R>(out: Vec<Result<R, ItemPanic>>) -> Vec<R> {
        out.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn preserves_order_across_workers() {
        let items: Vec<u32> = (0..23).collect();
        let out = settled(parallel_map(&items, 4, |x| x * 2).unwrap());
        assert_eq!(out, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn handles_empty_and_oversized_pools() {
        assert!(parallel_map(&Vec::<u32>::new(), 8, |x| *x).unwrap().is_empty());
        assert_eq!(settled(parallel_map(&[1, 2], 16, |x| x + 1).unwrap()), vec![2, 3]);
    }

    #[test]
    fn panicking_item_does_not_sink_its_neighbours() {
        let items = [1, 2, 3, 4];
        for workers in [1, 2] {
            let out = parallel_map(&items, workers, |x| {
                if *x == 3 {
                    panic!("boom on {x}");
                }
                *x
            })
            .unwrap();
            assert_eq!(out[0], Ok(1));
            assert_eq!(out[1], Ok(2));
            assert_eq!(out[2], Err(ItemPanic("boom on 3".to_string())));
            assert_eq!(out[3], Ok(4));
        }
    }

    #[test]
    fn item_panic_becomes_an_invariant_error() {
        let err = DomainError::from(ItemPanic("boom".to_string()));
        assert_eq!(err.kind(), ddmrp_core::ErrorKind::InvariantViolation);
        assert!(err.to_string().contains("boom"));
    }
}
