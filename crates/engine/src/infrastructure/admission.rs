//! Admission gate bounding simultaneous outbound inference calls.
//!
//! Backed by a tokio `Semaphore`, which grants permits in FIFO order, so a
//! waiting caller is never overtaken by a later one. Waiting is not an error.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("Admission gate is closed")]
pub struct GateClosed;

pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    bound: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionGate {
    /// Create a gate admitting at most `bound` calls at once (minimum 1).
    pub fn new(bound: usize) -> Self {
        let bound = bound.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(bound)),
            bound,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Calls currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls observed since creation.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Wait for a permit, then drive `call` to completion while holding it.
    pub async fn run<F, T>(&self, call: F) -> Result<T, GateClosed>
    where
        F: Future<Output = T>,
    {
        let waiting = self.semaphore.available_permits() == 0;
        if waiting {
            tracing::debug!(bound = self.bound, "Admission gate full, waiting for a permit");
        }
        let _permit = self.semaphore.acquire().await.map_err(|_| GateClosed)?;
        let _slot = InFlightSlot::enter(self);
        Ok(call.await)
    }
}

/// Keeps the in-flight counter accurate even if the call is dropped mid-way.
struct InFlightSlot<'a> {
    gate: &'a AdmissionGate,
}

impl<'a> InFlightSlot<'a> {
    fn enter(gate: &'a AdmissionGate) -> Self {
        let now = gate.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        gate.peak.fetch_max(now, Ordering::SeqCst);
        Self { gate }
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
