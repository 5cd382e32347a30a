use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

use crate::error::DocSinkResult;
use crate::types::{Division, EntityId, Organization};

/// Complete persisted state of the hierarchy.
///
/// Each level is a plain id to document mapping, serialized as a JSON object keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchySnapshot {
    pub organizations: BTreeMap<EntityId, Organization>,
    pub divisions: BTreeMap<EntityId, Division>,
}

impl HierarchySnapshot {
    /// Builds a snapshot keyed by the id of each document.
    pub fn from_documents(
        organizations: impl IntoIterator<Item = Organization>,
        divisions: impl IntoIterator<Item = Division>,
    ) -> Self {
        Self {
            organizations: organizations
                .into_iter()
                .map(|organization| (organization.id, organization))
                .collect(),
            divisions: divisions
                .into_iter()
                .map(|division| (division.id, division))
                .collect(),
        }
    }
}

/// Trait for persisting the hierarchy between restarts.
///
/// [`SnapshotStore`] implementations decide where a [`HierarchySnapshot`] lives. A store that
/// has never been written to must load as [`None`] rather than fail.
pub trait SnapshotStore {
    /// Loads the last stored snapshot, if any.
    fn load_snapshot(&self) -> impl Future<Output = DocSinkResult<Option<HierarchySnapshot>>> + Send;

    /// Replaces the stored snapshot with `snapshot`.
    fn store_snapshot(
        &self,
        snapshot: HierarchySnapshot,
    ) -> impl Future<Output = DocSinkResult<()>> + Send;
}
