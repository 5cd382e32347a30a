//! Folding of normalized changes into the hierarchy.
//!
//! Each entry point reads and writes the [`HierarchyStore`] and returns the write instructions
//! for the organization documents it changed. Calls are synchronous and must be serialized by
//! the caller: the store only guarantees atomicity of single-key reads and writes.

mod delete;
mod placeholder;
mod sync;
mod upsert;

pub use placeholder::{PlaceholderPolicy, STUB_ORGANIZATION_NAME};

use crate::error::DocSinkResult;
use crate::store::HierarchyStore;
use crate::types::{DivisionChange, EntityChange, OrganizationChange, UnitChange, WriteInstruction};

/// Merges changes of all three hierarchy levels into a [`HierarchyStore`].
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: HierarchyStore,
    placeholders: PlaceholderPolicy,
}

impl Reconciler {
    pub fn new(store: HierarchyStore, placeholders: PlaceholderPolicy) -> Self {
        Self {
            store,
            placeholders,
        }
    }

    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    pub fn placeholders(&self) -> PlaceholderPolicy {
        self.placeholders
    }

    /// Applies `change` and returns the resulting writes, in order.
    pub fn apply(&self, change: &EntityChange) -> DocSinkResult<Vec<WriteInstruction>> {
        match change {
            EntityChange::Organization(OrganizationChange::Upsert { id, name }) => {
                self.upsert_organization(*id, name)
            }
            EntityChange::Organization(OrganizationChange::Delete { id }) => {
                self.delete_organization(*id)
            }
            EntityChange::Division(DivisionChange::Upsert {
                id,
                name,
                organization_id,
            }) => self.upsert_division(*id, name, *organization_id),
            EntityChange::Division(DivisionChange::Delete { id }) => self.delete_division(*id),
            EntityChange::Unit(UnitChange::Upsert {
                id,
                name,
                division_id,
            }) => self.upsert_unit(*id, name, *division_id),
            EntityChange::Unit(UnitChange::Delete { id, division_id }) => {
                self.delete_unit(*id, *division_id)
            }
        }
    }
}
