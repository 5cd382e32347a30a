use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::DocSinkResult;
use crate::store::snapshot::{HierarchySnapshot, SnapshotStore};

#[derive(Debug, Default)]
struct Inner {
    snapshot: Option<HierarchySnapshot>,
    writes: usize,
}

/// In-memory snapshot storage for testing and for pipelines that start cold every time.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySnapshotStore {
    /// Creates an empty memory snapshot store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: HierarchySnapshot) -> Self {
        let inner = Inner {
            snapshot: Some(snapshot),
            writes: 0,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns a copy of the last stored snapshot.
    pub async fn snapshot(&self) -> Option<HierarchySnapshot> {
        let inner = self.inner.lock().await;
        inner.snapshot.clone()
    }

    /// Returns how many times a snapshot has been stored.
    pub async fn writes(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.writes
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn load_snapshot(&self) -> DocSinkResult<Option<HierarchySnapshot>> {
        let inner = self.inner.lock().await;

        Ok(inner.snapshot.clone())
    }

    async fn store_snapshot(&self, snapshot: HierarchySnapshot) -> DocSinkResult<()> {
        let mut inner = self.inner.lock().await;

        inner.snapshot = Some(snapshot);
        inner.writes += 1;

        Ok(())
    }
}
