//! Bounded execution of pipeline stages.
//!
//! Each stage of each document takes one permit, so at most `size` stages run
//! at once across all documents. A document's stages still run strictly in
//! order because the manager's per-document lock serializes them.

use super::manager::DocumentManager;
use crate::documents::model::{DocumentId, LifecycleState};
use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Upper bound on `advance` calls per drive; the happy path needs five.
const MAX_ADVANCES: usize = 8;

/// Backoff while another caller holds the document's run lock.
const CONFLICT_BACKOFF_START: Duration = Duration::from_millis(10);
const CONFLICT_BACKOFF_MAX: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub dispatched: u64,
    pub stages_run: u64,
    pub ready: u64,
    pub failed: u64,
    pub conflicts: u64,
}

#[derive(Debug, Clone)]
pub struct WorkerPool {
    size: usize,
    permits: Arc<Semaphore>,
    stats: Arc<Mutex<PoolStats>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            permits: Arc::new(Semaphore::new(size)),
            stats: Arc::new(Mutex::new(PoolStats::default())),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stats(&self) -> PoolStats {
        *self.stats.lock()
    }

    /// Spawns a task that drives the document to a terminal state.
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, manager: Arc<DocumentManager>, id: DocumentId) -> JoinHandle<CoreResult<LifecycleState>> {
        self.stats.lock().dispatched += 1;
        let pool = self.clone();
        tokio::spawn(async move { pool.drive(&manager, &id).await })
    }

    /// Advances stage by stage until `Ready` or `Failed`. A `Conflict` means
    /// some other caller holds the document; the drive backs off and retries
    /// without spending one of its advances.
    pub async fn drive(&self, manager: &DocumentManager, id: &DocumentId) -> CoreResult<LifecycleState> {
        let mut advances = 0;
        let mut backoff = CONFLICT_BACKOFF_START;
        while advances < MAX_ADVANCES {
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .map_err(|_| CoreError::Cancelled)?;
            let result = manager.advance(id).await;
            drop(permit);

            match result {
                Ok(state) => {
                    advances += 1;
                    backoff = CONFLICT_BACKOFF_START;
                    let mut stats = self.stats.lock();
                    stats.stages_run += 1;
                    match state {
                        LifecycleState::Ready => {
                            stats.ready += 1;
                            return Ok(state);
                        }
                        LifecycleState::Failed => {
                            stats.failed += 1;
                            return Ok(state);
                        }
                        _ => {}
                    }
                }
                Err(CoreError::Conflict(_)) => {
                    self.stats.lock().conflicts += 1;
                    tracing::debug!(
                        document_id = %id,
                        backoff_ms = backoff.as_millis() as u64,
                        "document already being advanced elsewhere"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(CONFLICT_BACKOFF_MAX);
                }
                Err(err) => return Err(err),
            }
        }
        manager.status(id).map(|s| s.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_at_least_one() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.stats(), PoolStats::default());
    }
}
