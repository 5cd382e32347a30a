use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A CDC record as delivered by the event stream: a Debezium key and value.
///
/// Both parts are kept as raw JSON; their shape is checked by the normalizer so that a
/// malformed record fails on its own instead of failing the decoding of the stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    #[serde(default)]
    pub key: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl ChangeEnvelope {
    pub fn new(key: Option<Value>, value: Option<Value>) -> Self {
        Self { key, value }
    }

    /// Returns `true` if the value is absent, null or an empty object.
    pub fn is_tombstone(&self) -> bool {
        match &self.value {
            None | Some(Value::Null) => true,
            Some(Value::Object(map)) => map.is_empty(),
            Some(_) => false,
        }
    }
}
