use std::fmt;

use node_overlay_core_types::{FieldPath, RuleId};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::errors::PayloadError;
use crate::node::Node;
use crate::schema::Schema;
use crate::selector::LabelSelector;

/// A conditional overlay: when `selector` admits a target, `payload` is merged
/// into that target's template. Larger priorities apply later.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
    #[serde(default, rename = "patch")]
    pub payload: Payload,
    #[serde(default)]
    pub priority: Priority,
}

impl Rule {
    pub fn new(selector: LabelSelector, payload: Payload) -> Self {
        Self {
            name: None,
            selector: Some(selector),
            payload,
            priority: Priority::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn id(&self, index: usize) -> RuleId {
        RuleId::new(index, self.name.clone())
    }
}

/// Priority as written. Integers of any width are kept so range problems can
/// be reported per rule; anything else is kept as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Priority {
    Integer(i128),
    Malformed(String),
}

impl Priority {
    pub fn value(&self) -> Option<i128> {
        match self {
            Priority::Integer(value) => Some(*value),
            Priority::Malformed(_) => None,
        }
    }

    pub fn sort_key(&self) -> i128 {
        self.value().unwrap_or(0)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Integer(0)
    }
}

impl From<i64> for Priority {
    fn from(value: i64) -> Self {
        Priority::Integer(value.into())
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority::Integer(value.into())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Integer(value) => f.pad(&value.to_string()),
            Priority::Malformed(raw) => f.pad(raw),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Priority::Integer(value) => match i64::try_from(*value) {
                Ok(narrow) => serializer.serialize_i64(narrow),
                Err(_) => serializer.serialize_i128(*value),
            },
            Priority::Malformed(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriorityVisitor)
    }
}

struct PriorityVisitor;

impl<'de> Visitor<'de> for PriorityVisitor {
    type Value = Priority;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer priority")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Priority, E> {
        Ok(Priority::Integer(value.into()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Priority, E> {
        Ok(Priority::Integer(value.into()))
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> Result<Priority, E> {
        Ok(Priority::Integer(value))
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> Result<Priority, E> {
        Ok(i128::try_from(value)
            .map(Priority::Integer)
            .unwrap_or_else(|_| Priority::Malformed(value.to_string())))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Priority, E> {
        // Integers too wide for u64 reach here as floats.
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e38 {
            Ok(Priority::Integer(value as i128))
        } else {
            Ok(Priority::Malformed(value.to_string()))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Priority, E> {
        Ok(Priority::Malformed(value.to_string()))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Priority, E> {
        Ok(Priority::Malformed(value.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Priority, E> {
        Ok(Priority::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Priority, E> {
        Ok(Priority::default())
    }
}

/// Raw patch bytes as supplied by the user.
///
/// Deserializes from an embedded document or from a string holding JSON/YAML
/// text; either way the bytes are kept so fingerprints see exactly what was
/// written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload {
    raw: Vec<u8>,
}

impl Payload {
    pub fn from_bytes(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::default(),
            // Serializing a Value cannot fail.
            other => Self::from_bytes(serde_json::to_vec(other).unwrap_or_default()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.iter().all(u8::is_ascii_whitespace)
    }

    /// Decodes the raw bytes as JSON, falling back to YAML.
    pub fn to_document(&self, path: &FieldPath) -> Result<Value, PayloadError> {
        if self.is_empty() {
            return Err(PayloadError::Empty { path: path.clone() });
        }
        match serde_json::from_slice::<Value>(&self.raw) {
            Ok(value) => Ok(value),
            Err(json_err) => serde_yaml::from_slice::<Value>(&self.raw).map_err(|yaml_err| {
                PayloadError::Unparsable {
                    path: path.clone(),
                    reason: format!("json error: {json_err}; yaml error: {yaml_err}"),
                }
            }),
        }
    }

    /// Decodes and types the payload against `schema`. The top level must be an object.
    pub fn parse(&self, schema: &Schema, path: &FieldPath) -> Result<Node, PayloadError> {
        let document = self.to_document(path)?;
        if !document.is_object() {
            return Err(PayloadError::TypeMismatch {
                path: path.clone(),
                expected: "object",
                found: crate::node::json_kind(&document),
            });
        }
        Node::parse(&document, schema.root(), path)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::from_value(&value)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match serde_json::from_slice::<Value>(&self.raw) {
            Ok(value) => value.serialize(serializer),
            Err(_) => serializer.serialize_str(&String::from_utf8_lossy(&self.raw)),
        }
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(text) => Payload::from_bytes(text.into_bytes()),
            other => Payload::from_value(&other),
        })
    }
}
