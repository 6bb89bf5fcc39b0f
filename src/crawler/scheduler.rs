//! Admission control for endpoint fetches
//!
//! This module handles:
//! - Selecting which stored endpoints a run processes (depth limit)
//! - Bounding the number of fetch tasks in flight via a semaphore

use crate::model::Endpoint;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A slot in the fetch ceiling, released when dropped
///
/// The permit travels with the spawned task so the slot is freed on every
/// exit path of that task, including panics and cancellation.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

/// Caps the number of concurrently running fetch tasks
///
/// Permits are handed out in request order, so endpoints are admitted in the
/// order they are submitted.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Creates a gate admitting at most `capacity` tasks (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot
    ///
    /// # Returns
    ///
    /// * `Some(GatePermit)` - A slot, held until the permit is dropped
    /// * `None` - The semaphore was closed
    pub async fn admit(&self) -> Option<GatePermit> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;
        Some(GatePermit { _permit: permit })
    }
}

/// Returns the endpoints a run should process, in stored order
///
/// `None` processes everything; `Some(n)` keeps the first `n`.
pub fn select_endpoints(mut endpoints: Vec<Endpoint>, depth: Option<usize>) -> Vec<Endpoint> {
    if let Some(depth) = depth {
        if depth < endpoints.len() {
            tracing::info!(
                "Depth limit {} applied to {} endpoints",
                depth,
                endpoints.len()
            );
            endpoints.truncate(depth);
        }
    }
    endpoints
}
