use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Organization};

/// Write handed to the document storage. The target is always an organization document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WriteInstruction {
    /// Replaces the whole document, creating it when `upsert` is set and it does not exist.
    Replace {
        target_id: EntityId,
        document: Organization,
        upsert: bool,
    },
    Delete {
        target_id: EntityId,
    },
}

impl WriteInstruction {
    /// Builds an upserting replace of `organization`.
    pub fn replace(organization: Organization) -> Self {
        WriteInstruction::Replace {
            target_id: organization.id,
            document: organization,
            upsert: true,
        }
    }

    pub fn delete(target_id: EntityId) -> Self {
        WriteInstruction::Delete { target_id }
    }

    pub fn target_id(&self) -> EntityId {
        match self {
            WriteInstruction::Replace { target_id, .. } | WriteInstruction::Delete { target_id } => {
                *target_id
            }
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, WriteInstruction::Delete { .. })
    }
}
