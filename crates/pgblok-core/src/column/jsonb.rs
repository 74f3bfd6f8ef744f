use crate::value::Value;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error as ThisError;

///
/// JsonbError
///

#[derive(Debug, ThisError)]
pub enum JsonbError {
    #[error("failed to encode jsonb value: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode jsonb value: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("expected a jsonb value, found {found}")]
    UnexpectedValue { found: &'static str },
}

///
/// Jsonb
///
/// JSONB column adapter. By default a top-level JSON `null` is stored as SQL
/// `NULL`, so "no value" never turns into a stored `'null'::jsonb`. Nested
/// nulls and absent keys keep their exact shape.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Jsonb {
    none_as_null: bool,
}

impl Default for Jsonb {
    fn default() -> Self {
        Self::new()
    }
}

impl Jsonb {
    #[must_use]
    pub const fn new() -> Self {
        Self { none_as_null: true }
    }

    /// Store a top-level JSON `null` as `'null'::jsonb` instead of SQL `NULL`.
    #[must_use]
    pub const fn keep_json_null() -> Self {
        Self {
            none_as_null: false,
        }
    }

    #[must_use]
    pub const fn none_as_null(&self) -> bool {
        self.none_as_null
    }

    /// Column value to bind for `value`.
    #[must_use]
    pub fn to_value(&self, value: Option<&serde_json::Value>) -> Value {
        match value {
            None => Value::Null,
            Some(serde_json::Value::Null) if self.none_as_null => Value::Null,
            Some(json) => Value::Json(json.clone()),
        }
    }

    /// Stored column value back to JSON; SQL `NULL` reads as `None`.
    pub fn from_value(&self, value: &Value) -> Result<Option<serde_json::Value>, JsonbError> {
        match value {
            Value::Null => Ok(None),
            Value::Json(json) => Ok(Some(json.clone())),
            Value::Text(text) => serde_json::from_str(text)
                .map(Some)
                .map_err(JsonbError::Decode),
            other => Err(JsonbError::UnexpectedValue {
                found: kind_name(other),
            }),
        }
    }

    pub fn encode<T: Serialize>(&self, value: Option<&T>) -> Result<Value, JsonbError> {
        let json = value
            .map(serde_json::to_value)
            .transpose()
            .map_err(JsonbError::Encode)?;

        Ok(self.to_value(json.as_ref()))
    }

    pub fn decode<T: DeserializeOwned>(&self, value: &Value) -> Result<Option<T>, JsonbError> {
        self.from_value(value)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(JsonbError::Decode)
    }
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Int(_) => "integer",
        Value::Float(_) => "float",
        Value::Text(_) => "text",
        Value::Bytes(_) => "bytea",
        Value::Json(_) => "jsonb",
        Value::Oid(_) => "oid",
    }
}
