//! Concurrent in-memory registry of execution records.
//!
//! Records are never evicted: every execution lives for the lifetime of the
//! process, so the map grows without bound.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error};

use super::record::ExecutionRecord;
use super::TrackerError;

/// Shared handle to one live record.
///
/// Readers only get cloned snapshots. Mutation is crate-private and reserved
/// for the background task that owns the execution.
#[derive(Clone, Debug)]
pub struct ExecutionHandle {
    inner: Arc<RwLock<ExecutionRecord>>,
}

impl ExecutionHandle {
    fn new(record: ExecutionRecord) -> Self {
        Self {
            inner: Arc::new(RwLock::new(record)),
        }
    }

    /// Consistent copy of the record as of now.
    pub async fn snapshot(&self) -> ExecutionRecord {
        self.inner.read().await.clone()
    }

    pub(crate) async fn update<R>(&self, f: impl FnOnce(&mut ExecutionRecord) -> R) -> R {
        let mut rec = self.inner.write().await;
        f(&mut rec)
    }
}

/// Keyed store of every execution ever started.
#[derive(Clone, Default)]
pub struct ExecutionStore {
    records: Arc<RwLock<HashMap<String, ExecutionHandle>>>,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh RUNNING record under `id`.
    pub async fn create(&self, id: &str) -> Result<ExecutionHandle, TrackerError> {
        let mut records = self.records.write().await;
        if records.contains_key(id) {
            error!(execution_id = %id, "duplicate execution id");
            return Err(TrackerError::DuplicateId(id.to_string()));
        }
        let handle = ExecutionHandle::new(ExecutionRecord::new(id));
        records.insert(id.to_string(), handle.clone());
        debug!(execution_id = %id, total = records.len(), "execution record created");
        Ok(handle)
    }

    pub async fn get(&self, id: &str) -> Result<ExecutionHandle, TrackerError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    /// Handles for every record present when the map lock was taken.
    pub async fn list(&self) -> Vec<ExecutionHandle> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
