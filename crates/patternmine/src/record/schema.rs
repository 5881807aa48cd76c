//! Declared field types used during normalization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::value::render_value;

/// Expected scalar type for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Boolean values.
    Boolean,
    /// Text values.
    Text,
}

impl FieldType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Cast a value to this type. Returns `None` when the cast fails.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => None,

            (FieldType::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    Some(value.clone())
                } else {
                    let f = n.as_f64()?;
                    f.is_finite().then(|| Value::from(f.trunc() as i64))
                }
            }
            (FieldType::Integer, Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(Value::from)
            }
            (FieldType::Integer, Value::Bool(b)) => Some(Value::from(i64::from(*b))),

            (FieldType::Float, Value::Number(n)) => {
                Number::from_f64(n.as_f64()?).map(Value::Number)
            }
            (FieldType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (FieldType::Float, Value::Bool(b)) => {
                Some(Value::from(if *b { 1.0 } else { 0.0 }))
            }

            (FieldType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (FieldType::Boolean, Value::Number(n)) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
            (FieldType::Boolean, Value::String(s)) => {
                match s.trim().to_lowercase().as_str() {
                    "true" | "yes" | "t" | "y" | "1" => Some(Value::Bool(true)),
                    "false" | "no" | "f" | "n" | "0" => Some(Value::Bool(false)),
                    _ => None,
                }
            }

            (FieldType::Text, Value::String(_)) => Some(value.clone()),
            (FieldType::Text, Value::Number(_) | Value::Bool(_)) => {
                Some(Value::String(render_value(value)))
            }

            _ => None,
        }
    }
}

/// Mapping from field name to expected type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema(IndexMap<String, FieldType>);

impl FieldSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field type.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.0.insert(name.into(), field_type);
        self
    }

    /// Look up a field's declared type.
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.0.get(name).copied()
    }

    /// Iterate over declared fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns true if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
