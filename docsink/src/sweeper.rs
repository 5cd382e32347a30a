//! Removal of drained placeholder organizations.

use std::collections::HashSet;
use tracing::info;

use crate::reconciler::PlaceholderPolicy;
use crate::store::HierarchyStore;
use crate::types::{EntityId, Organization, WriteInstruction};

/// Removes placeholder organizations whose divisions are all embedded in real organizations.
#[derive(Debug, Clone)]
pub struct CleanupSweeper {
    store: HierarchyStore,
    placeholders: PlaceholderPolicy,
}

impl CleanupSweeper {
    pub fn new(store: HierarchyStore, placeholders: PlaceholderPolicy) -> Self {
        Self {
            store,
            placeholders,
        }
    }

    /// Removes every drained placeholder and returns a delete for each of them.
    ///
    /// Placeholders without divisions, or with a division no real organization embeds yet, are
    /// left in place.
    pub fn sweep(&self) -> Vec<WriteInstruction> {
        let (placeholders, real): (Vec<Organization>, Vec<Organization>) = self
            .store
            .organizations()
            .into_iter()
            .partition(|organization| self.placeholders.is_placeholder(organization.id));

        if placeholders.is_empty() {
            return Vec::new();
        }

        let promoted: HashSet<EntityId> = real
            .iter()
            .flat_map(|organization| organization.divisions.iter().map(|division| division.id))
            .collect();

        let mut instructions = Vec::new();
        for placeholder in placeholders {
            let drained = !placeholder.divisions.is_empty()
                && placeholder
                    .divisions
                    .iter()
                    .all(|division| promoted.contains(&division.id));

            if drained {
                self.store.remove_organization(placeholder.id);
                info!(
                    placeholder_id = %placeholder.id,
                    divisions = placeholder.divisions.len(),
                    "removed drained placeholder organization"
                );
                instructions.push(WriteInstruction::delete(placeholder.id));
            }
        }

        instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Division;

    const THRESHOLD: i64 = 1_000;

    fn organization(id: i64, divisions: &[i64]) -> Organization {
        let mut organization = Organization::new(EntityId(id), format!("Organization {id}"));
        for division_id in divisions {
            organization.upsert_division(&Division::new(
                EntityId(*division_id),
                "d",
                None,
                vec![],
            ));
        }

        organization
    }

    fn sweeper(store: &HierarchyStore) -> CleanupSweeper {
        CleanupSweeper::new(store.clone(), PlaceholderPolicy::new(THRESHOLD))
    }

    #[test]
    fn removes_fully_drained_placeholder() {
        let store = HierarchyStore::new();
        store.put_organization(organization(9, &[5]));
        store.put_organization(organization(THRESHOLD + 5, &[5]));

        let instructions = sweeper(&store).sweep();

        assert_eq!(
            instructions,
            vec![WriteInstruction::delete(EntityId(THRESHOLD + 5))]
        );
        assert!(!store.contains_organization(EntityId(THRESHOLD + 5)));
        assert!(store.contains_organization(EntityId(9)));
    }

    #[test]
    fn keeps_partially_drained_and_empty_placeholders() {
        let store = HierarchyStore::new();
        store.put_organization(organization(9, &[5]));
        store.put_organization(organization(THRESHOLD + 5, &[5, 6]));
        store.put_organization(organization(THRESHOLD + 7, &[]));

        let instructions = sweeper(&store).sweep();

        assert!(instructions.is_empty());
        assert_eq!(store.organization_count(), 3);
    }

    #[test]
    fn placeholders_do_not_drain_each_other() {
        let store = HierarchyStore::new();
        store.put_organization(organization(THRESHOLD + 5, &[5]));
        store.put_organization(organization(THRESHOLD + 6, &[5]));

        assert!(sweeper(&store).sweep().is_empty());
    }
}
