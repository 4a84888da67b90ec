//! Time-bounded, retried factor lookups.

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use ddmrp_core::{DomainError, DomainResult, ProductLocationPair};
use ddmrp_decoupling::{FactorSource, FactorValues, ScoringMode};
use tracing::warn;

use crate::retry::RetryPolicy;

/// Wraps a [`FactorSource`] call in a timeout and a retry policy.
///
/// Each attempt runs on its own thread; an attempt that overruns the timeout
/// is abandoned (its thread finishes in the background and its answer is
/// dropped) and counts as an `ExternalLookup` failure.
#[derive(Debug, Clone)]
pub struct BoundedLookup {
    timeout: Duration,
    retry: RetryPolicy,
}

impl BoundedLookup {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }

    pub fn fetch(
        &self,
        source: &Arc<dyn FactorSource>,
        pair: &ProductLocationPair,
        mode: ScoringMode,
    ) -> DomainResult<FactorValues> {
        self.call(source, pair, "factor lookup", move |s, p| s.factor_values(p, mode))
    }

    /// Item-master buffer profile of a pair, under the same bounds.
    pub fn fetch_profile(
        &self,
        source: &Arc<dyn FactorSource>,
        pair: &ProductLocationPair,
    ) -> DomainResult<Option<String>> {
        self.call(source, pair, "profile lookup", |s, p| s.buffer_profile_id(p))
    }

    fn call<T, F>(
        &self,
        source: &Arc<dyn FactorSource>,
        pair: &ProductLocationPair,
        what: &'static str,
        op: F,
    ) -> DomainResult<T>
    where
        T: Send + 'static,
        F: Fn(&dyn FactorSource, &ProductLocationPair) -> DomainResult<T> + Copy + Send + 'static,
    {
        self.retry.run(|attempt| {
            let result = self.attempt(source, pair, what, op);
            if let Err(e @ DomainError::ExternalLookup(_)) = &result {
                warn!(pair = %pair, attempt, error = %e, "{what} failed");
            }
            result
        })
    }

    fn attempt<T, F>(
        &self,
        source: &Arc<dyn FactorSource>,
        pair: &ProductLocationPair,
        what: &'static str,
        op: F,
    ) -> DomainResult<T>
    where
        T: Send + 'static,
        F: Fn(&dyn FactorSource, &ProductLocationPair) -> DomainResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let source = Arc::clone(source);
        let owned_pair = pair.clone();

        thread::Builder::new()
            .name("factor-lookup".to_string())
            .spawn(move || {
                let _ = tx.send(op(&*source, &owned_pair));
            })
            .map_err(|e| DomainError::external(format!("cannot spawn lookup thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(DomainError::external(format!(
                "{what} for {pair} timed out after {} ms",
                self.timeout.as_millis()
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(DomainError::external(format!(
                "{what} for {pair} aborted"
            ))),
        }
    }
}
