//! Validators checking single key/value pairs.

mod schema;
mod type_check;

pub use schema::{FieldSchema, SchemaValidator};
pub use type_check::TypeValidator;

use serde_json::Value;
use std::fmt;

/// JSON value kinds a schema entry can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    /// Integer or float.
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ValueKind {
    /// Whether `value` is of this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Float => value.is_f64(),
            ValueKind::Number => value.is_number(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Array => value.is_array(),
            ValueKind::Object => value.is_object(),
            ValueKind::Null => value.is_null(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn type_error(key: &str, kind: ValueKind) -> String {
    format!("'{key}' must be of type {kind}")
}
