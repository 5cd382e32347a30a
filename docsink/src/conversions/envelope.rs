//! Normalization of CDC envelopes into [`Change`]s.
//!
//! The table name is resolved to a [`HierarchyLevel`] once here, so the reconciler only ever
//! sees typed per-level changes.

use docsink_config::shared::TableMappingConfig;
use serde_json::Value;
use tracing::{debug, warn};

use crate::conversions::row::{Row, optional_id, optional_object, required_id, required_string};
use crate::error::{DocSinkResult, ErrorKind};
use crate::types::{
    Change, ChangeEnvelope, DivisionChange, EntityChange, EntityId, HierarchyLevel, Operation,
    OrganizationChange, UnitChange,
};
use crate::{bail, docsink_error};

const ID_FIELD: &str = "id";
const NAME_FIELD: &str = "name";
const OPERATION_FIELD: &str = "op";
const BEFORE_FIELD: &str = "before";
const AFTER_FIELD: &str = "after";
const SOURCE_FIELD: &str = "source";
const TABLE_FIELD: &str = "table";
const PAYLOAD_FIELD: &str = "payload";

/// Converts a CDC envelope into a normalized [`Change`].
///
/// Returns [`None`] for tombstones and for tables that are not part of the hierarchy. A
/// malformed envelope fails with an event-scoped error and never affects other envelopes.
pub fn parse_change_from_envelope(
    envelope: &ChangeEnvelope,
    tables: &TableMappingConfig,
) -> DocSinkResult<Option<Change>> {
    if envelope.is_tombstone() {
        debug!(key = ?envelope.key, "skipping tombstone envelope");
        return Ok(None);
    }

    let value = match &envelope.value {
        Some(Value::Object(value)) => unwrap_payload(value),
        Some(other) => bail!(
            ErrorKind::InvalidData,
            "Envelope value is not an object",
            format!("value holds {other}")
        ),
        None => return Ok(None),
    };

    // Other tables may use operation codes the hierarchy does not know, such as truncates.
    let table = parse_table_name(value)?;
    let Some(level) = resolve_level(table, tables) else {
        warn!(table, "received a change for an unknown table, skipping it");
        return Ok(None);
    };

    let operation = parse_operation(value)?;

    let key_id = match &envelope.key {
        Some(Value::Object(key)) => optional_id(unwrap_payload(key), ID_FIELD)?,
        _ => None,
    };

    let row = build_row(operation, value, key_id)?;
    let entity = build_entity_change(level, operation, &row, tables)?;

    Ok(Some(Change { operation, entity }))
}

/// Maps a source table name onto its hierarchy level.
pub fn resolve_level(table: &str, tables: &TableMappingConfig) -> Option<HierarchyLevel> {
    if table == tables.organization_table {
        Some(HierarchyLevel::Organization)
    } else if table == tables.division_table {
        Some(HierarchyLevel::Division)
    } else if table == tables.unit_table {
        Some(HierarchyLevel::Unit)
    } else {
        None
    }
}

/// Unwraps the `payload` of an envelope serialized together with its schema.
fn unwrap_payload(object: &Row) -> &Row {
    if object.contains_key(OPERATION_FIELD) || object.contains_key(ID_FIELD) {
        return object;
    }

    match object.get(PAYLOAD_FIELD) {
        Some(Value::Object(payload)) => payload,
        _ => object,
    }
}

fn parse_operation(value: &Row) -> DocSinkResult<Operation> {
    let code = match value.get(OPERATION_FIELD) {
        Some(Value::String(code)) => code,
        _ => bail!(
            ErrorKind::InvalidData,
            "Envelope has no operation code",
            "field `op` is absent or not a string"
        ),
    };

    Operation::from_code(code).ok_or_else(|| {
        docsink_error!(
            ErrorKind::UnsupportedOperation,
            "Envelope has an unsupported operation code",
            format!("operation code `{code}`")
        )
    })
}

fn parse_table_name(value: &Row) -> DocSinkResult<&str> {
    let table = optional_object(value, SOURCE_FIELD)?
        .and_then(|source| source.get(TABLE_FIELD))
        .and_then(Value::as_str);

    match table {
        Some(table) => Ok(table),
        None => bail!(
            ErrorKind::InvalidData,
            "Envelope has no source table",
            "field `source.table` is absent or not a string"
        ),
    }
}

/// Selects the row image that describes the changed entity.
fn build_row(operation: Operation, value: &Row, key_id: Option<EntityId>) -> DocSinkResult<Row> {
    match operation {
        Operation::Delete => {
            if let Some(before) = optional_object(value, BEFORE_FIELD)? {
                return Ok(before.clone());
            }

            // Without a before image only the key identifies the deleted row.
            let mut row = Row::new();
            if let Some(id) = key_id {
                row.insert(ID_FIELD.to_string(), Value::from(id.into_inner()));
            }

            Ok(row)
        }
        Operation::Update => {
            let mut row = require_after(value)?.clone();

            if optional_id(&row, ID_FIELD)?.is_none() {
                let before_id = match optional_object(value, BEFORE_FIELD)? {
                    Some(before) => optional_id(before, ID_FIELD)?,
                    None => None,
                };

                if let Some(id) = before_id.or(key_id) {
                    row.insert(ID_FIELD.to_string(), Value::from(id.into_inner()));
                }
            }

            Ok(row)
        }
        Operation::Create | Operation::Read => Ok(require_after(value)?.clone()),
    }
}

fn require_after(value: &Row) -> DocSinkResult<&Row> {
    match optional_object(value, AFTER_FIELD)? {
        Some(after) => Ok(after),
        None => bail!(
            ErrorKind::InvalidData,
            "Envelope has no after image",
            "field `after` is absent or null"
        ),
    }
}

fn build_entity_change(
    level: HierarchyLevel,
    operation: Operation,
    row: &Row,
    tables: &TableMappingConfig,
) -> DocSinkResult<EntityChange> {
    let id = required_id(row, ID_FIELD)?;

    let entity = match (level, operation.is_delete()) {
        (HierarchyLevel::Organization, true) => {
            EntityChange::Organization(OrganizationChange::Delete { id })
        }
        (HierarchyLevel::Organization, false) => {
            EntityChange::Organization(OrganizationChange::Upsert {
                id,
                name: required_string(row, NAME_FIELD)?,
            })
        }
        (HierarchyLevel::Division, true) => EntityChange::Division(DivisionChange::Delete { id }),
        (HierarchyLevel::Division, false) => EntityChange::Division(DivisionChange::Upsert {
            id,
            name: required_string(row, NAME_FIELD)?,
            organization_id: required_id(row, &tables.organization_id_column)?,
        }),
        (HierarchyLevel::Unit, true) => {
            // Only a positive division id is a usable hint.
            let division_id = optional_id(row, &tables.division_id_column)?
                .filter(|division_id| division_id.into_inner() > 0);

            EntityChange::Unit(UnitChange::Delete { id, division_id })
        }
        (HierarchyLevel::Unit, false) => EntityChange::Unit(UnitChange::Upsert {
            id,
            name: required_string(row, NAME_FIELD)?,
            division_id: required_id(row, &tables.division_id_column)?,
        }),
    };

    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tables() -> TableMappingConfig {
        TableMappingConfig::default()
    }

    fn envelope(key: Option<Value>, value: Value) -> ChangeEnvelope {
        ChangeEnvelope::new(key, Some(value))
    }

    #[test]
    fn create_uses_after_image() {
        let envelope = envelope(
            None,
            json!({
                "op": "c",
                "after": {"id": 5, "name": "Research", "organization_id": 9},
                "source": {"table": "division"}
            }),
        );

        let change = parse_change_from_envelope(&envelope, &tables()).unwrap().unwrap();

        assert_eq!(change.operation, Operation::Create);
        assert_eq!(
            change.entity,
            EntityChange::Division(DivisionChange::Upsert {
                id: EntityId(5),
                name: "Research".to_string(),
                organization_id: EntityId(9),
            })
        );
    }

    #[test]
    fn update_backfills_id_from_before_then_key() {
        let from_before = envelope(
            Some(json!({"payload": {"id": 2}})),
            json!({
                "op": "u",
                "before": {"id": 1},
                "after": {"name": "Renamed"},
                "source": {"table": "organization"}
            }),
        );
        let from_key = envelope(
            Some(json!({"payload": {"id": 2}})),
            json!({
                "op": "u",
                "before": null,
                "after": {"name": "Renamed"},
                "source": {"table": "organization"}
            }),
        );

        let first = parse_change_from_envelope(&from_before, &tables()).unwrap().unwrap();
        let second = parse_change_from_envelope(&from_key, &tables()).unwrap().unwrap();

        assert_eq!(first.entity.id(), EntityId(1));
        assert_eq!(second.entity.id(), EntityId(2));
    }

    #[test]
    fn delete_without_before_falls_back_to_key() {
        let envelope = envelope(
            Some(json!({"payload": {"id": 11}})),
            json!({"op": "d", "before": null, "source": {"table": "unit"}}),
        );

        let change = parse_change_from_envelope(&envelope, &tables()).unwrap().unwrap();

        assert_eq!(
            change.entity,
            EntityChange::Unit(UnitChange::Delete {
                id: EntityId(11),
                division_id: None,
            })
        );
    }

    #[test]
    fn unit_delete_keeps_only_positive_division_hint() {
        let with_hint = envelope(
            None,
            json!({"op": "d", "before": {"id": 1, "division_id": 5}, "source": {"table": "unit"}}),
        );
        let zero_hint = envelope(
            None,
            json!({"op": "d", "before": {"id": 1, "division_id": 0}, "source": {"table": "unit"}}),
        );

        let with_hint = parse_change_from_envelope(&with_hint, &tables()).unwrap().unwrap();
        let zero_hint = parse_change_from_envelope(&zero_hint, &tables()).unwrap().unwrap();

        assert_eq!(
            with_hint.entity,
            EntityChange::Unit(UnitChange::Delete {
                id: EntityId(1),
                division_id: Some(EntityId(5)),
            })
        );
        assert_eq!(
            zero_hint.entity,
            EntityChange::Unit(UnitChange::Delete {
                id: EntityId(1),
                division_id: None,
            })
        );
    }

    #[test]
    fn tombstones_and_unknown_tables_are_skipped() {
        let tombstone = ChangeEnvelope::new(Some(json!({"id": 1})), Some(json!({})));
        let unknown = envelope(
            None,
            json!({"op": "c", "after": {"id": 1}, "source": {"table": "audit_log"}}),
        );

        assert_eq!(parse_change_from_envelope(&tombstone, &tables()).unwrap(), None);
        assert_eq!(parse_change_from_envelope(&unknown, &tables()).unwrap(), None);
    }

    #[test]
    fn unknown_tables_are_skipped_whatever_their_operation() {
        for operation in ["t", "m", "x"] {
            let unknown = envelope(
                None,
                json!({"op": operation, "source": {"table": "audit_log"}}),
            );

            assert_eq!(
                parse_change_from_envelope(&unknown, &tables()).unwrap(),
                None,
                "operation {operation}"
            );
        }
    }

    #[test]
    fn unwraps_schema_payload_wrapper() {
        let envelope = envelope(
            None,
            json!({
                "schema": {"type": "struct"},
                "payload": {
                    "op": "r",
                    "after": {"id": 3, "name": "Org"},
                    "source": {"table": "organization"}
                }
            }),
        );

        let change = parse_change_from_envelope(&envelope, &tables()).unwrap().unwrap();

        assert_eq!(change.operation, Operation::Read);
        assert_eq!(change.entity.level(), HierarchyLevel::Organization);
    }

    #[test]
    fn malformed_envelopes_fail_with_event_scoped_errors() {
        let cases = [
            (
                json!({"op": "c", "after": {"name": "x"}, "source": {"table": "organization"}}),
                ErrorKind::MissingField,
            ),
            (
                json!({"op": "c", "after": {"id": "x1", "name": "x"}, "source": {"table": "organization"}}),
                ErrorKind::ConversionError,
            ),
            (
                json!({"op": "t", "after": {"id": 1}, "source": {"table": "organization"}}),
                ErrorKind::UnsupportedOperation,
            ),
            (
                json!({"op": "c", "after": {"id": 1, "name": "x"}}),
                ErrorKind::InvalidData,
            ),
            (
                json!({"op": "c", "after": {"id": 1, "name": "x"}, "source": {"table": "unit"}}),
                ErrorKind::MissingField,
            ),
        ];

        for (value, expected) in cases {
            let err = parse_change_from_envelope(&envelope(None, value.clone()), &tables())
                .unwrap_err();
            assert_eq!(err.kind(), expected, "envelope {value}");
            assert!(err.kind().is_event_scoped());
        }
    }

    #[test]
    fn honors_custom_table_mapping() {
        let tables = TableMappingConfig {
            organization_table: "university".to_string(),
            division_table: "institute".to_string(),
            unit_table: "department".to_string(),
            organization_id_column: "id_university".to_string(),
            division_id_column: "id_institute".to_string(),
        };
        let envelope = envelope(
            None,
            json!({
                "op": "c",
                "after": {"id": 4, "name": "Chemistry", "id_institute": 2},
                "source": {"table": "department"}
            }),
        );

        let change = parse_change_from_envelope(&envelope, &tables).unwrap().unwrap();

        assert_eq!(
            change.entity,
            EntityChange::Unit(UnitChange::Upsert {
                id: EntityId(4),
                name: "Chemistry".to_string(),
                division_id: EntityId(2),
            })
        );
    }
}
