use std::fmt;

use crate::types::EntityId;

/// CDC operation code of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// Parses a Debezium operation code (`c`, `r`, `u`, `d`).
    pub fn from_code(code: &str) -> Option<Operation> {
        match code {
            "c" => Some(Operation::Create),
            "r" => Some(Operation::Read),
            "u" => Some(Operation::Update),
            "d" => Some(Operation::Delete),
            _ => None,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };

        f.write_str(name)
    }
}

/// Level of the hierarchy a source table maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyLevel {
    Organization,
    Division,
    Unit,
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HierarchyLevel::Organization => "organization",
            HierarchyLevel::Division => "division",
            HierarchyLevel::Unit => "unit",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationChange {
    Upsert { id: EntityId, name: String },
    Delete { id: EntityId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DivisionChange {
    Upsert {
        id: EntityId,
        name: String,
        organization_id: EntityId,
    },
    Delete {
        id: EntityId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitChange {
    Upsert {
        id: EntityId,
        name: String,
        division_id: EntityId,
    },
    /// `division_id` is the hint carried by the deleted row, when it had one.
    Delete {
        id: EntityId,
        division_id: Option<EntityId>,
    },
}

/// Change of a single entity, already dispatched onto its hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityChange {
    Organization(OrganizationChange),
    Division(DivisionChange),
    Unit(UnitChange),
}

impl EntityChange {
    pub fn level(&self) -> HierarchyLevel {
        match self {
            EntityChange::Organization(_) => HierarchyLevel::Organization,
            EntityChange::Division(_) => HierarchyLevel::Division,
            EntityChange::Unit(_) => HierarchyLevel::Unit,
        }
    }

    /// Id of the changed entity.
    pub fn id(&self) -> EntityId {
        match self {
            EntityChange::Organization(
                OrganizationChange::Upsert { id, .. } | OrganizationChange::Delete { id },
            ) => *id,
            EntityChange::Division(
                DivisionChange::Upsert { id, .. } | DivisionChange::Delete { id },
            ) => *id,
            EntityChange::Unit(UnitChange::Upsert { id, .. } | UnitChange::Delete { id, .. }) => {
                *id
            }
        }
    }
}

/// Normalized change produced from one CDC envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Operation of the originating envelope.
    pub operation: Operation,
    pub entity: EntityChange,
}
