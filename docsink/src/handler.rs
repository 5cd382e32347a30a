//! Processing of a single change from envelope to write instructions.

use docsink_config::shared::{HierarchyConfig, TableMappingConfig};
use tracing::debug;

use crate::conversions::envelope::parse_change_from_envelope;
use crate::emitter::EmittedChanges;
use crate::error::DocSinkResult;
use crate::reconciler::{PlaceholderPolicy, Reconciler};
use crate::store::HierarchyStore;
use crate::sweeper::CleanupSweeper;
use crate::types::{Change, ChangeEnvelope};

/// Runs normalization, reconciliation, cleanup and emission for one change at a time.
///
/// Handling is synchronous and runs to completion. Callers sharing a store between handlers
/// must serialize the calls themselves.
#[derive(Debug, Clone)]
pub struct ChangeHandler {
    tables: TableMappingConfig,
    reconciler: Reconciler,
    sweeper: CleanupSweeper,
}

impl ChangeHandler {
    pub fn new(config: &HierarchyConfig, store: HierarchyStore) -> Self {
        let placeholders = PlaceholderPolicy::new(config.placeholder_id_threshold);

        Self {
            tables: config.tables.clone(),
            reconciler: Reconciler::new(store.clone(), placeholders),
            sweeper: CleanupSweeper::new(store, placeholders),
        }
    }

    pub fn store(&self) -> &HierarchyStore {
        self.reconciler.store()
    }

    pub fn placeholders(&self) -> PlaceholderPolicy {
        self.reconciler.placeholders()
    }

    /// Handles a raw envelope, returning [`None`] when it normalizes to nothing.
    pub fn handle_envelope(&self, envelope: &ChangeEnvelope) -> DocSinkResult<Option<EmittedChanges>> {
        let Some(change) = parse_change_from_envelope(envelope, &self.tables)? else {
            return Ok(None);
        };

        self.handle_change(&change).map(Some)
    }

    /// Handles a normalized change.
    pub fn handle_change(&self, change: &Change) -> DocSinkResult<EmittedChanges> {
        let primary = self.reconciler.apply(&change.entity)?;
        let cleanup = self.sweeper.sweep();

        debug!(
            operation = %change.operation,
            level = %change.entity.level(),
            id = %change.entity.id(),
            primary = primary.len(),
            cleanup = cleanup.len(),
            "handled change"
        );

        Ok(EmittedChanges::new(primary, cleanup))
    }
}
