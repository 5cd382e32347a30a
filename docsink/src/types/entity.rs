use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural key of an organization, division or unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    /// Creates a new [`EntityId`].
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw integer value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Leaf of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
}

impl Unit {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Mid level of the hierarchy.
///
/// The same type is used for the flat index entry and for the copy embedded in an
/// organization. Embedded copies never carry `organization_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<EntityId>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl Division {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        organization_id: Option<EntityId>,
        units: Vec<Unit>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            organization_id,
            units,
        }
    }

    /// Returns the copy of this division that is embedded in an organization document.
    pub fn embedded_copy(&self) -> Division {
        Division {
            id: self.id,
            name: self.name.clone(),
            organization_id: None,
            units: self.units.clone(),
        }
    }

    /// Returns `true` if both divisions hold the same content, ignoring the back-reference.
    pub fn same_content(&self, other: &Division) -> bool {
        self.id == other.id && self.name == other.name && self.units == other.units
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub fn contains_unit(&self, id: EntityId) -> bool {
        self.unit(id).is_some()
    }

    /// Renames the unit with the same id in place, or appends it.
    pub fn upsert_unit(&mut self, unit: Unit) {
        match self.units.iter_mut().find(|existing| existing.id == unit.id) {
            Some(existing) => existing.name = unit.name,
            None => self.units.push(unit),
        }
    }

    /// Removes the unit with `id`, returning whether it was present.
    pub fn remove_unit(&mut self, id: EntityId) -> bool {
        let before = self.units.len();
        self.units.retain(|unit| unit.id != id);

        self.units.len() != before
    }

    /// Appends every unit of `units` whose id is not present yet. Existing units are kept as is.
    pub fn merge_units<'a>(&mut self, units: impl IntoIterator<Item = &'a Unit>) {
        for unit in units {
            if !self.contains_unit(unit.id) {
                self.units.push(unit.clone());
            }
        }
    }
}

/// Top level of the hierarchy and the only document written to the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub divisions: Vec<Division>,
}

impl Organization {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            divisions: Vec::new(),
        }
    }

    pub fn division(&self, id: EntityId) -> Option<&Division> {
        self.divisions.iter().find(|division| division.id == id)
    }

    pub fn division_mut(&mut self, id: EntityId) -> Option<&mut Division> {
        self.divisions.iter_mut().find(|division| division.id == id)
    }

    pub fn contains_division(&self, id: EntityId) -> bool {
        self.division(id).is_some()
    }

    /// Replaces name and units of the embedded division with the same id, or appends a copy.
    pub fn upsert_division(&mut self, division: &Division) {
        match self.division_mut(division.id) {
            Some(existing) => {
                existing.name = division.name.clone();
                existing.units = division.units.clone();
            }
            None => self.divisions.push(division.embedded_copy()),
        }
    }

    /// Removes the embedded division with `id`, returning it if present.
    pub fn remove_division(&mut self, id: EntityId) -> Option<Division> {
        let position = self.divisions.iter().position(|division| division.id == id)?;

        Some(self.divisions.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_unit_renames_in_place() {
        let mut division = Division::new(EntityId(1), "d", None, vec![Unit::new(EntityId(7), "a")]);

        division.upsert_unit(Unit::new(EntityId(7), "b"));
        division.upsert_unit(Unit::new(EntityId(8), "c"));

        assert_eq!(
            division.units,
            vec![Unit::new(EntityId(7), "b"), Unit::new(EntityId(8), "c")]
        );
    }

    #[test]
    fn merge_units_only_appends_missing_ids() {
        let mut division = Division::new(EntityId(1), "d", None, vec![Unit::new(EntityId(1), "kept")]);
        let incoming = [Unit::new(EntityId(1), "ignored"), Unit::new(EntityId(2), "new")];

        division.merge_units(&incoming);

        assert_eq!(
            division.units,
            vec![Unit::new(EntityId(1), "kept"), Unit::new(EntityId(2), "new")]
        );
    }

    #[test]
    fn embedded_copy_drops_back_reference() {
        let division = Division::new(EntityId(3), "d", Some(EntityId(9)), vec![]);
        let copy = division.embedded_copy();

        assert_eq!(copy.organization_id, None);
        assert!(copy.same_content(&division));
    }

    #[test]
    fn organization_serializes_with_document_ids() {
        let mut organization = Organization::new(EntityId(9), "Org");
        organization.upsert_division(&Division::new(
            EntityId(5),
            "Div",
            Some(EntityId(9)),
            vec![Unit::new(EntityId(1), "Unit")],
        ));

        let json = serde_json::to_value(&organization).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "_id": 9,
                "name": "Org",
                "divisions": [
                    {"_id": 5, "name": "Div", "units": [{"_id": 1, "name": "Unit"}]}
                ]
            })
        );
    }
}
