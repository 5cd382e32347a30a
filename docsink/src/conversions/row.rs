//! Typed field access on JSON row images.

use serde_json::{Map, Value};

use crate::bail;
use crate::error::{DocSinkResult, ErrorKind};
use crate::types::EntityId;

/// A row image (`before`, `after` or key payload) of a CDC envelope.
pub type Row = Map<String, Value>;

/// Reads an integer id from `field`, returning [`None`] when the field is absent or null.
///
/// Accepts JSON integers and strings holding an integer, which is how some connectors encode
/// 64-bit keys.
pub fn optional_id(row: &Row, field: &str) -> DocSinkResult<Option<EntityId>> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(id) => Ok(Some(EntityId(id))),
            None => bail!(
                ErrorKind::ConversionError,
                "Id field is not an integer",
                format!("field `{field}` holds {number}")
            ),
        },
        Some(Value::String(text)) => Ok(Some(EntityId(text.trim().parse::<i64>()?))),
        Some(other) => bail!(
            ErrorKind::ConversionError,
            "Id field is not an integer",
            format!("field `{field}` holds {other}")
        ),
    }
}

/// Reads an integer id from `field`, failing when it is absent.
pub fn required_id(row: &Row, field: &str) -> DocSinkResult<EntityId> {
    match optional_id(row, field)? {
        Some(id) => Ok(id),
        None => bail!(
            ErrorKind::MissingField,
            "Row is missing a required id",
            format!("field `{field}` is absent or null")
        ),
    }
}

/// Reads a string from `field`, failing when it is absent or not a string.
pub fn required_string(row: &Row, field: &str) -> DocSinkResult<String> {
    match row.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        None | Some(Value::Null) => bail!(
            ErrorKind::MissingField,
            "Row is missing a required field",
            format!("field `{field}` is absent or null")
        ),
        Some(other) => bail!(
            ErrorKind::InvalidData,
            "Row field is not a string",
            format!("field `{field}` holds {other}")
        ),
    }
}

/// Returns the object stored at `field`, treating a missing field and null alike.
pub fn optional_object<'a>(value: &'a Row, field: &str) -> DocSinkResult<Option<&'a Row>> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object)),
        Some(other) => bail!(
            ErrorKind::InvalidData,
            "Envelope field is not an object",
            format!("field `{field}` holds {other}")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn reads_ids_from_numbers_and_strings() {
        let row = row(json!({"a": 4, "b": "17", "c": null}));

        assert_eq!(optional_id(&row, "a").unwrap(), Some(EntityId(4)));
        assert_eq!(optional_id(&row, "b").unwrap(), Some(EntityId(17)));
        assert_eq!(optional_id(&row, "c").unwrap(), None);
        assert_eq!(optional_id(&row, "missing").unwrap(), None);
    }

    #[test]
    fn rejects_unparsable_ids() {
        let row = row(json!({"float": 1.5, "text": "abc", "list": [1]}));

        for field in ["float", "text", "list"] {
            let err = optional_id(&row, field).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConversionError, "field {field}");
        }
    }

    #[test]
    fn required_fields_report_missing_values() {
        let row = row(json!({"name": 3}));

        assert_eq!(
            required_id(&row, "id").unwrap_err().kind(),
            ErrorKind::MissingField
        );
        assert_eq!(
            required_string(&row, "name").unwrap_err().kind(),
            ErrorKind::InvalidData
        );
    }
}
