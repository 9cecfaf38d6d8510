use node_overlay_core_types::{FieldPath, LabelSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PayloadError;
use crate::node::json_kind;

/// A pod template document. Schema conformance is checked by the resolver, not here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Template {
    document: Value,
}

impl Template {
    pub fn from_value(document: Value) -> Result<Self, PayloadError> {
        if !document.is_object() {
            return Err(PayloadError::TypeMismatch {
                path: FieldPath::root(),
                expected: "object",
                found: json_kind(&document),
            });
        }
        Ok(Self { document })
    }

    pub fn as_value(&self) -> &Value {
        &self.document
    }

    pub fn into_value(self) -> Value {
        self.document
    }

    /// JSON pointer lookup, e.g. `/spec/containers/0/image`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.document.pointer(pointer)
    }

    pub fn labels(&self) -> LabelSet {
        self.document
            .pointer("/metadata/labels")
            .and_then(Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(key, value)| {
                        value.as_str().map(|value| (key.clone(), value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn containers(&self) -> &[Value] {
        self.document
            .pointer("/spec/containers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn container(&self, name: &str) -> Option<&Value> {
        self.containers()
            .iter()
            .find(|container| container.get("name").and_then(Value::as_str) == Some(name))
    }

    /// Sorted-key JSON encoding; identical documents always encode identically.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // serde_json's default map is ordered by key, so plain serialization is canonical.
        serde_json::to_vec(&self.document).unwrap_or_default()
    }
}

impl TryFrom<Value> for Template {
    type Error = PayloadError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Template::from_value(value)
    }
}

impl From<Template> for Value {
    fn from(template: Template) -> Self {
        template.document
    }
}
