use serde_json::{Value, json};

use crate::types::ChangeEnvelope;

/// Builds a Debezium-shaped envelope wrapped in a `schema`/`payload` pair.
pub fn change_envelope(
    table: &str,
    op: &str,
    id: i64,
    before: Option<Value>,
    after: Option<Value>,
) -> ChangeEnvelope {
    let key = json!({
        "schema": {"type": "struct"},
        "payload": {"id": id}
    });
    let value = json!({
        "schema": {"type": "struct"},
        "payload": {
            "op": op,
            "before": before,
            "after": after,
            "source": {"table": table}
        }
    });

    ChangeEnvelope::new(Some(key), Some(value))
}

pub fn organization_created(id: i64, name: &str) -> ChangeEnvelope {
    change_envelope(
        "organization",
        "c",
        id,
        None,
        Some(json!({"id": id, "name": name})),
    )
}

pub fn organization_updated(id: i64, name: &str) -> ChangeEnvelope {
    change_envelope(
        "organization",
        "u",
        id,
        Some(json!({"id": id})),
        Some(json!({"id": id, "name": name})),
    )
}

pub fn organization_deleted(id: i64) -> ChangeEnvelope {
    change_envelope(
        "organization",
        "d",
        id,
        Some(json!({"id": id})),
        None,
    )
}

pub fn division_created(id: i64, name: &str, organization_id: i64) -> ChangeEnvelope {
    change_envelope(
        "division",
        "c",
        id,
        None,
        Some(json!({"id": id, "name": name, "organization_id": organization_id})),
    )
}

pub fn division_updated(id: i64, name: &str, organization_id: i64) -> ChangeEnvelope {
    change_envelope(
        "division",
        "u",
        id,
        Some(json!({"id": id, "name": name, "organization_id": organization_id})),
        Some(json!({"id": id, "name": name, "organization_id": organization_id})),
    )
}

pub fn division_deleted(id: i64) -> ChangeEnvelope {
    change_envelope("division", "d", id, Some(json!({"id": id})), None)
}

pub fn unit_created(id: i64, name: &str, division_id: i64) -> ChangeEnvelope {
    change_envelope(
        "unit",
        "c",
        id,
        None,
        Some(json!({"id": id, "name": name, "division_id": division_id})),
    )
}

/// Builds a unit delete, with the division id in the before image when given.
pub fn unit_deleted(id: i64, division_id: Option<i64>) -> ChangeEnvelope {
    let before = match division_id {
        Some(division_id) => json!({"id": id, "division_id": division_id}),
        None => json!({"id": id}),
    };

    change_envelope("unit", "d", id, Some(before), None)
}

/// Builds the tombstone that follows a delete on a compacted topic.
pub fn tombstone(id: i64) -> ChangeEnvelope {
    ChangeEnvelope::new(Some(json!({"id": id})), None)
}
