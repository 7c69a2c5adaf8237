//! Admission control for concurrent domain scans.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error_handling::ScanError;

/// Bounds how many domains are resolved at the same time.
///
/// Each admitted domain holds one permit until its scan task finishes.
/// Closing the limiter makes every pending and future admission fail.
#[derive(Debug, Clone)]
pub struct ScanLimiter {
    semaphore: Arc<Semaphore>,
    quota: usize,
}

impl ScanLimiter {
    /// Creates a limiter admitting `quota` domains at once.
    ///
    /// `quota` must already be resolved (see
    /// [`resolve_concurrency`](crate::config::resolve_concurrency)); a zero is
    /// raised to one so that scans can make progress.
    pub fn new(quota: usize) -> Self {
        let quota = quota.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(quota)),
            quota,
        }
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Closed` if the limiter was closed.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, ScanError> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ScanError::Closed)
    }

    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}
