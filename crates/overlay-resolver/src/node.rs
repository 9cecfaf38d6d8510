use std::collections::{BTreeMap, BTreeSet};

use node_overlay_core_types::FieldPath;
use serde_json::{Map, Value};

use crate::errors::PayloadError;
use crate::schema::{FieldSchema, MergeKey, ScalarKind};

/// A document typed against a [`FieldSchema`]. Merge dispatches on pairs of these tags.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Null,
    Scalar(Value),
    Map(BTreeMap<String, Node>),
    KeyedList {
        merge_key: String,
        items: Vec<(String, Node)>,
    },
    List(Vec<Node>),
}

impl Node {
    pub fn parse(value: &Value, schema: &FieldSchema, path: &FieldPath) -> Result<Node, PayloadError> {
        if value.is_null() {
            return Ok(Node::Null);
        }
        match schema {
            FieldSchema::Free => Ok(Node::free(value)),
            FieldSchema::Scalar(kind) => parse_scalar(value, *kind, path),
            FieldSchema::Struct(fields) => {
                let object = expect_object(value, path)?;
                let mut children = BTreeMap::new();
                for (name, child) in object {
                    if child.is_null() {
                        children.insert(name.clone(), Node::Null);
                        continue;
                    }
                    let child_path = path.child(name.as_str());
                    let Some(child_schema) = fields.get(name) else {
                        return Err(PayloadError::UnknownField { path: child_path });
                    };
                    children.insert(name.clone(), Node::parse(child, child_schema, &child_path)?);
                }
                Ok(Node::Map(children))
            }
            FieldSchema::Map(value_schema) => {
                let object = expect_object(value, path)?;
                let mut children = BTreeMap::new();
                for (key, child) in object {
                    children.insert(
                        key.clone(),
                        Node::parse(child, value_schema, &path.key(key.as_str()))?,
                    );
                }
                Ok(Node::Map(children))
            }
            FieldSchema::KeyedList { merge_key, element } => {
                parse_keyed_list(value, merge_key, element, path)
            }
            FieldSchema::AtomicList(element) => {
                let items = expect_array(value, path)?;
                let mut nodes = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    nodes.push(Node::parse(item, element, &path.index(idx))?);
                }
                Ok(Node::List(nodes))
            }
        }
    }

    /// Untyped conversion: objects become maps, arrays anonymous lists.
    pub fn free(value: &Value) -> Node {
        match value {
            Value::Null => Node::Null,
            Value::Object(object) => Node::Map(
                object
                    .iter()
                    .map(|(key, child)| (key.clone(), Node::free(child)))
                    .collect(),
            ),
            Value::Array(items) => Node::List(items.iter().map(Node::free).collect()),
            scalar => Node::Scalar(scalar.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Scalar(value) => value.clone(),
            Node::Map(children) => {
                let mut object = Map::new();
                for (key, child) in children {
                    if !matches!(child, Node::Null) {
                        object.insert(key.clone(), child.to_value());
                    }
                }
                Value::Object(object)
            }
            Node::KeyedList { items, .. } => {
                Value::Array(items.iter().map(|(_, item)| item.to_value()).collect())
            }
            Node::List(items) => Value::Array(items.iter().map(Node::to_value).collect()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Scalar(_) => "scalar",
            Node::Map(_) => "object",
            Node::KeyedList { .. } => "keyed list",
            Node::List(_) => "list",
        }
    }

    /// Drops null-valued object fields, recursively.
    pub fn prune_nulls(self) -> Node {
        match self {
            Node::Map(children) => Node::Map(
                children
                    .into_iter()
                    .filter(|(_, child)| !matches!(child, Node::Null))
                    .map(|(key, child)| (key, child.prune_nulls()))
                    .collect(),
            ),
            Node::KeyedList { merge_key, items } => Node::KeyedList {
                merge_key,
                items: items
                    .into_iter()
                    .map(|(key, item)| (key, item.prune_nulls()))
                    .collect(),
            },
            Node::List(items) => Node::List(items.into_iter().map(Node::prune_nulls).collect()),
            other => other,
        }
    }
}

fn parse_scalar(value: &Value, kind: ScalarKind, path: &FieldPath) -> Result<Node, PayloadError> {
    let accepted = match kind {
        ScalarKind::String => value.is_string(),
        ScalarKind::Integer => value.is_i64() || value.is_u64(),
        ScalarKind::Boolean => value.is_boolean(),
        ScalarKind::Number => value.is_number(),
        ScalarKind::IntOrString => value.is_string() || value.is_number(),
        ScalarKind::Any => !value.is_object() && !value.is_array(),
    };
    if accepted {
        Ok(Node::Scalar(value.clone()))
    } else {
        Err(PayloadError::TypeMismatch {
            path: path.clone(),
            expected: kind.describe(),
            found: json_kind(value),
        })
    }
}

fn parse_keyed_list(
    value: &Value,
    merge_key: &MergeKey,
    element: &FieldSchema,
    path: &FieldPath,
) -> Result<Node, PayloadError> {
    let items = expect_array(value, path)?;
    let mut seen = BTreeSet::new();
    let mut nodes = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let item_path = path.index(idx);
        let object = expect_object(item, &item_path)?;
        let key = element_key(object, merge_key, &item_path)?;
        if !seen.insert(key.clone()) {
            return Err(PayloadError::DuplicateMergeKey {
                path: item_path,
                key: merge_key.describe(),
                value: key,
            });
        }
        let node = Node::parse(item, element, &path.key(key.as_str()))?;
        nodes.push((key, node));
    }
    Ok(Node::KeyedList {
        merge_key: merge_key.describe(),
        items: nodes,
    })
}

/// Identity of a keyed list element; compound keys are joined with `/`.
fn element_key(
    object: &Map<String, Value>,
    merge_key: &MergeKey,
    path: &FieldPath,
) -> Result<String, PayloadError> {
    let mut parts = Vec::new();
    for (field, default) in merge_key.fields() {
        let part = match (object.get(field), default) {
            (None | Some(Value::Null), Some(default)) => default.to_string(),
            (None | Some(Value::Null), None) => {
                return Err(PayloadError::MissingMergeKey {
                    path: path.clone(),
                    key: field.to_string(),
                })
            }
            (Some(Value::String(part)), _) => part.clone(),
            (Some(Value::Number(part)), _) => part.to_string(),
            (Some(other), _) => {
                return Err(PayloadError::TypeMismatch {
                    path: path.child(field),
                    expected: "string or number",
                    found: json_kind(other),
                })
            }
        };
        parts.push(part);
    }
    Ok(parts.join("/"))
}

fn expect_object<'a>(value: &'a Value, path: &FieldPath) -> Result<&'a Map<String, Value>, PayloadError> {
    value.as_object().ok_or_else(|| PayloadError::TypeMismatch {
        path: path.clone(),
        expected: "object",
        found: json_kind(value),
    })
}

fn expect_array<'a>(value: &'a Value, path: &FieldPath) -> Result<&'a Vec<Value>, PayloadError> {
    value.as_array().ok_or_else(|| PayloadError::TypeMismatch {
        path: path.clone(),
        expected: "list",
        found: json_kind(value),
    })
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn parse_pod(value: Value) -> Result<Node, PayloadError> {
        Node::parse(&value, Schema::pod_template().root(), &FieldPath::root())
    }

    #[test]
    fn keyed_lists_are_tagged_with_their_merge_key() {
        let node = parse_pod(json!({
            "spec": {"containers": [{"name": "agent", "env": [{"name": "A", "value": "1"}]}]}
        }))
        .unwrap();
        let Node::Map(root) = node else {
            panic!("root should be a map")
        };
        let Some(Node::Map(spec)) = root.get("spec") else {
            panic!("spec should be a map")
        };
        match spec.get("containers") {
            Some(Node::KeyedList { merge_key, items }) => {
                assert_eq!(merge_key, "name");
                assert_eq!(items[0].0, "agent");
            }
            other => panic!("unexpected containers node: {other:?}"),
        }
    }

    #[test]
    fn list_where_scalar_expected_is_rejected() {
        let err = parse_pod(json!({
            "spec": {"containers": [{"name": "agent", "image": ["a", "b"]}]}
        }))
        .unwrap_err();
        assert_eq!(
            err,
            PayloadError::TypeMismatch {
                path: FieldPath::new(["spec", "containers"]).key("agent").child("image"),
                expected: "string",
                found: "list",
            }
        );
    }

    #[test]
    fn unknown_struct_field_is_rejected() {
        let err = parse_pod(json!({"spec": {"containerz": []}})).unwrap_err();
        assert_eq!(err.path().to_string(), "spec.containerz");
    }

    #[test]
    fn keyed_list_element_needs_merge_key() {
        let err = parse_pod(json!({"spec": {"containers": [{"image": "x"}]}})).unwrap_err();
        assert!(matches!(err, PayloadError::MissingMergeKey { ref key, .. } if key == "name"));
        assert_eq!(err.path().to_string(), "spec.containers[0]");
    }

    #[test]
    fn duplicate_merge_keys_are_rejected() {
        let err = parse_pod(json!({
            "spec": {"containers": [{"name": "a"}, {"name": "a"}]}
        }))
        .unwrap_err();
        assert!(matches!(err, PayloadError::DuplicateMergeKey { .. }));
    }

    #[test]
    fn numeric_merge_keys_are_normalized() {
        let node = parse_pod(json!({
            "spec": {"containers": [{"name": "a", "ports": [{"containerPort": 8080}]}]}
        }))
        .unwrap();
        let value = node.to_value();
        assert_eq!(value["spec"]["containers"][0]["ports"][0]["containerPort"], json!(8080));
    }

    #[test]
    fn ports_are_keyed_by_port_and_protocol() {
        let node = parse_pod(json!({
            "spec": {"containers": [{"name": "dns", "ports": [
                {"name": "dns", "containerPort": 53, "protocol": "UDP"},
                {"name": "dns-tcp", "containerPort": 53, "protocol": "TCP"}
            ]}]}
        }))
        .unwrap();
        assert_eq!(
            node.to_value()["spec"]["containers"][0]["ports"][1]["name"],
            json!("dns-tcp")
        );

        // A port without a protocol is the TCP one.
        let err = parse_pod(json!({
            "spec": {"containers": [{"name": "dns", "ports": [
                {"containerPort": 53, "protocol": "TCP"},
                {"containerPort": 53}
            ]}]}
        }))
        .unwrap_err();
        assert_eq!(
            err,
            PayloadError::DuplicateMergeKey {
                path: FieldPath::new(["spec", "containers"])
                    .key("dns")
                    .child("ports")
                    .index(1),
                key: "containerPort+protocol".to_string(),
                value: "53/TCP".to_string(),
            }
        );
    }

    #[test]
    fn null_fields_are_kept_whatever_their_name() {
        let node = parse_pod(json!({
            "metadata": {"creationTimestamp": null, "someFutureField": null},
            "spec": {"containers": [{"name": "a"}]}
        }))
        .unwrap();
        assert_eq!(
            node.to_value(),
            json!({"metadata": {}, "spec": {"containers": [{"name": "a"}]}})
        );
    }

    #[test]
    fn to_value_omits_null_fields() {
        let node = Node::free(&json!({"a": null, "b": 1}));
        assert_eq!(node.to_value(), json!({"b": 1}));
    }
}
