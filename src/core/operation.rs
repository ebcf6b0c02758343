//! Ledger operations
//!
//! The builder does not interpret operation payloads. It only brings raw
//! descriptors into the canonical `[name, {payload}]` form.

use crate::core::TransactionError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Suffix some clients append to operation type names
const OPERATION_SUFFIX: &str = "_operation";

/// One ledger action in canonical form
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    name: String,
    payload: Map<String, Value>,
}

impl Operation {
    pub fn new(name: &str, payload: Map<String, Value>) -> Result<Self, TransactionError> {
        let name = name.strip_suffix(OPERATION_SUFFIX).unwrap_or(name);
        if name.is_empty() {
            return Err(TransactionError::InvalidConstructionInput(
                "operation name is empty".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            payload,
        })
    }

    /// Wrap a raw descriptor.
    ///
    /// Accepts `["vote", {..}]` and `{"type": "vote_operation", "value": {..}}`.
    pub fn from_raw(raw: &Value) -> Result<Self, TransactionError> {
        match raw {
            Value::Array(items) => match items.as_slice() {
                [Value::String(name), Value::Object(payload)] => Self::new(name, payload.clone()),
                _ => Err(invalid(raw)),
            },
            Value::Object(fields) => match (fields.get("type"), fields.get("value")) {
                (Some(Value::String(name)), Some(Value::Object(payload))) => {
                    Self::new(name, payload.clone())
                }
                _ => Err(invalid(raw)),
            },
            _ => Err(invalid(raw)),
        }
    }

    /// Canonical descriptor, accepted again by [`Operation::from_raw`]
    pub fn to_raw(&self) -> Value {
        Value::Array(vec![
            Value::String(self.name.clone()),
            Value::Object(self.payload.clone()),
        ])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

fn invalid(raw: &Value) -> TransactionError {
    TransactionError::InvalidConstructionInput(format!("unrecognised operation descriptor: {}", raw))
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name, &self.payload).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Operation::from_raw(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vote() -> Value {
        json!(["vote", {"voter": "alice", "author": "bob", "permlink": "hello", "weight": 10000}])
    }

    #[test]
    fn test_from_array_descriptor() {
        let op = Operation::from_raw(&vote()).unwrap();
        assert_eq!(op.name(), "vote");
        assert_eq!(op.payload()["voter"], "alice");
        assert_eq!(op.to_raw(), vote());
    }

    #[test]
    fn test_from_typed_descriptor() {
        let raw = json!({
            "type": "vote_operation",
            "value": {"voter": "alice", "author": "bob", "permlink": "hello", "weight": 10000}
        });
        let op = Operation::from_raw(&raw).unwrap();
        assert_eq!(op, Operation::from_raw(&vote()).unwrap());
    }

    #[test]
    fn test_rejects_malformed_descriptors() {
        for raw in [
            json!("vote"),
            json!(["vote"]),
            json!(["vote", [1, 2]]),
            json!([1, {}]),
            json!({"type": "vote"}),
            json!(["", {}]),
            json!(["_operation", {}]),
        ] {
            assert!(
                matches!(
                    Operation::from_raw(&raw),
                    Err(TransactionError::InvalidConstructionInput(_))
                ),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_serializes_as_pair() {
        let op = Operation::from_raw(&vote()).unwrap();
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value, vote());

        let back: Operation = serde_json::from_value(value).unwrap();
        assert_eq!(back, op);
        assert!(serde_json::from_value::<Operation>(json!(42)).is_err());
    }
}
