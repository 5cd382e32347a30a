use dashmap::DashMap;
use std::sync::Arc;

use crate::store::snapshot::HierarchySnapshot;
use crate::types::{Division, EntityId, Organization};

/// Inner state of [`HierarchyStore`].
#[derive(Debug, Default)]
struct Inner {
    /// Organization documents keyed by id, placeholders included.
    organizations: DashMap<EntityId, Organization>,
    /// Flat index of every known division, carrying the back-reference to its organization.
    divisions: DashMap<EntityId, Division>,
}

/// Current state of the hierarchy: the organization documents and the flat division index.
///
/// Cloning is cheap and all clones share the same state. Reads hand out owned copies so that
/// no map guard is ever held while another entry of the same map is accessed.
#[derive(Debug, Clone, Default)]
pub struct HierarchyStore {
    inner: Arc<Inner>,
}

impl HierarchyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the content of `snapshot`.
    pub fn from_snapshot(snapshot: HierarchySnapshot) -> Self {
        let store = Self::new();
        store.hydrate(snapshot);

        store
    }

    pub fn organization(&self, id: EntityId) -> Option<Organization> {
        self.inner
            .organizations
            .get(&id)
            .map(|organization| organization.clone())
    }

    pub fn contains_organization(&self, id: EntityId) -> bool {
        self.inner.organizations.contains_key(&id)
    }

    pub fn put_organization(&self, organization: Organization) {
        self.inner.organizations.insert(organization.id, organization);
    }

    pub fn remove_organization(&self, id: EntityId) -> Option<Organization> {
        self.inner
            .organizations
            .remove(&id)
            .map(|(_, organization)| organization)
    }

    /// Returns a copy of every organization, sorted by id.
    pub fn organizations(&self) -> Vec<Organization> {
        let mut organizations: Vec<Organization> = self
            .inner
            .organizations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        organizations.sort_by_key(|organization| organization.id);

        organizations
    }

    pub fn organization_count(&self) -> usize {
        self.inner.organizations.len()
    }

    pub fn division(&self, id: EntityId) -> Option<Division> {
        self.inner.divisions.get(&id).map(|division| division.clone())
    }

    pub fn put_division(&self, division: Division) {
        self.inner.divisions.insert(division.id, division);
    }

    pub fn remove_division(&self, id: EntityId) -> Option<Division> {
        self.inner.divisions.remove(&id).map(|(_, division)| division)
    }

    /// Returns a copy of every flat division, sorted by id.
    pub fn divisions(&self) -> Vec<Division> {
        let mut divisions: Vec<Division> = self
            .inner
            .divisions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        divisions.sort_by_key(|division| division.id);

        divisions
    }

    pub fn division_count(&self) -> usize {
        self.inner.divisions.len()
    }

    /// Returns the ids of all flat divisions referencing `organization_id`, sorted.
    pub fn division_ids_of(&self, organization_id: EntityId) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .inner
            .divisions
            .iter()
            .filter(|entry| entry.value().organization_id == Some(organization_id))
            .map(|entry| *entry.key())
            .collect();
        ids.sort();

        ids
    }

    /// Captures the whole state of the store.
    pub fn snapshot(&self) -> HierarchySnapshot {
        HierarchySnapshot::from_documents(self.organizations(), self.divisions())
    }

    /// Replaces the whole state of the store with `snapshot`.
    pub fn hydrate(&self, snapshot: HierarchySnapshot) {
        self.inner.organizations.clear();
        self.inner.divisions.clear();

        // Documents are keyed by their own id, whatever key they were stored under.
        for organization in snapshot.organizations.into_values() {
            self.put_organization(organization);
        }
        for division in snapshot.divisions.into_values() {
            self.put_division(division);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let store = HierarchyStore::new();
        let clone = store.clone();

        clone.put_organization(Organization::new(EntityId(1), "Org"));

        assert!(store.contains_organization(EntityId(1)));
        assert_eq!(store.organization_count(), 1);
    }

    #[test]
    fn snapshot_round_trips_through_hydrate() {
        let store = HierarchyStore::new();
        store.put_organization(Organization::new(EntityId(2), "B"));
        store.put_organization(Organization::new(EntityId(1), "A"));
        store.put_division(Division::new(EntityId(5), "D", Some(EntityId(1)), vec![]));

        let snapshot = store.snapshot();
        let restored = HierarchyStore::from_snapshot(snapshot.clone());

        assert_eq!(
            snapshot.organizations.keys().copied().collect::<Vec<_>>(),
            vec![EntityId(1), EntityId(2)]
        );
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn finds_divisions_by_organization() {
        let store = HierarchyStore::new();
        store.put_division(Division::new(EntityId(7), "a", Some(EntityId(1)), vec![]));
        store.put_division(Division::new(EntityId(3), "b", Some(EntityId(1)), vec![]));
        store.put_division(Division::new(EntityId(4), "c", Some(EntityId(2)), vec![]));

        assert_eq!(
            store.division_ids_of(EntityId(1)),
            vec![EntityId(3), EntityId(7)]
        );
    }
}
