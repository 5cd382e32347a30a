use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::destination::Destination;
use crate::error::DocSinkResult;
use crate::types::{EntityId, Organization, WriteInstruction};

#[derive(Debug)]
struct Inner {
    instructions: Vec<WriteInstruction>,
    documents: BTreeMap<EntityId, Organization>,
}

/// In-memory destination for testing and development purposes.
///
/// [`MemoryDestination`] records every instruction it receives and applies them to an
/// in-memory document collection, so tests can assert on both the write sequence and the
/// resulting documents. All data is lost when the process terminates.
#[derive(Debug, Clone)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDestination {
    /// Creates a new empty memory destination.
    pub fn new() -> Self {
        let inner = Inner {
            instructions: Vec::new(),
            documents: BTreeMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns a copy of all instructions received so far, in arrival order.
    pub async fn instructions(&self) -> Vec<WriteInstruction> {
        let inner = self.inner.lock().await;
        inner.instructions.clone()
    }

    /// Returns a copy of the document collection after applying every instruction.
    pub async fn documents(&self) -> BTreeMap<EntityId, Organization> {
        let inner = self.inner.lock().await;
        inner.documents.clone()
    }

    /// Returns the stored document with `id`, if any.
    pub async fn document(&self, id: EntityId) -> Option<Organization> {
        let inner = self.inner.lock().await;
        inner.documents.get(&id).cloned()
    }

    /// Clears all stored instructions and documents.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.instructions.clear();
        inner.documents.clear();
    }
}

impl Default for MemoryDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl Destination for MemoryDestination {
    fn name() -> &'static str {
        "memory"
    }

    async fn write_instructions(&self, instructions: Vec<WriteInstruction>) -> DocSinkResult<()> {
        let mut inner = self.inner.lock().await;

        info!("writing a batch of {} instructions", instructions.len());

        for instruction in &instructions {
            match instruction {
                WriteInstruction::Replace {
                    target_id,
                    document,
                    ..
                } => {
                    inner.documents.insert(*target_id, document.clone());
                }
                WriteInstruction::Delete { target_id } => {
                    inner.documents.remove(target_id);
                }
            }
        }
        inner.instructions.extend(instructions);

        Ok(())
    }
}
