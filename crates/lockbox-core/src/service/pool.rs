//! Bounded worker pool for key derivation.
//!
//! PBKDF2 is deliberately slow and purely CPU-bound. Running it directly on an
//! async worker thread would stall every other request on that thread, so jobs
//! run on tokio's blocking pool behind a semaphore that caps how many
//! derivations are in flight at once.

use std::sync::Arc;

use lockbox_types::error::VaultError;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Semaphore-gated `spawn_blocking` executor.
///
/// Cancellation is only honoured while a job waits for a permit. Once a job
/// starts it runs to completion and its permit is released when it finishes,
/// even if the caller stopped waiting for the result.
#[derive(Clone)]
pub struct DerivationPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl DerivationPool {
    /// Create a pool allowing `max_concurrent` jobs at once (at least one).
    pub fn new(max_concurrent: usize) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of jobs that could start right now without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on the blocking pool once a permit is free.
    ///
    /// Returns `VaultError::Cancelled` if `cancel` fires before the job starts.
    pub async fn run<F, T>(&self, cancel: &CancellationToken, job: F) -> Result<T, VaultError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(VaultError::Cancelled),
            permit = Arc::clone(&self.permits).acquire_owned() => permit
                .map_err(|_| VaultError::Internal("derivation pool closed".to_string()))?,
        };

        if cancel.is_cancelled() {
            return Err(VaultError::Cancelled);
        }

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        });

        // The panic payload may quote secret material; log only its kind.
        handle.await.map_err(|e| {
            tracing::error!(
                panicked = e.is_panic(),
                cancelled = e.is_cancelled(),
                "derivation worker failed"
            );
            VaultError::Internal("derivation worker failed".to_string())
        })
    }
}
