//! Deep merge of a typed patch into an accumulated document.
//!
//! Scalars are replaced, objects merge key by key, keyed lists merge element
//! by merge key (existing order kept, new elements appended in patch order) and
//! anonymous lists are replaced wholesale. A `null` in the patch deletes the
//! field it names.

use node_overlay_core_types::FieldPath;

use crate::errors::MergeError;
use crate::node::Node;

pub fn merge(base: Node, patch: &Node, path: &FieldPath) -> Result<Node, MergeError> {
    match (base, patch) {
        (_, Node::Null) => Ok(Node::Null),
        (Node::Null, patch) => Ok(patch.clone().prune_nulls()),
        (Node::Map(mut fields), Node::Map(patch_fields)) => {
            for (name, patch_value) in patch_fields {
                if matches!(patch_value, Node::Null) {
                    fields.remove(name);
                    continue;
                }
                let merged = match fields.remove(name) {
                    Some(existing) => merge(existing, patch_value, &path.child(name.as_str()))?,
                    None => patch_value.clone().prune_nulls(),
                };
                fields.insert(name.clone(), merged);
            }
            Ok(Node::Map(fields))
        }
        (
            Node::KeyedList {
                merge_key,
                mut items,
            },
            Node::KeyedList {
                merge_key: patch_key,
                items: patch_items,
            },
        ) if merge_key == *patch_key => {
            for (key, patch_item) in patch_items {
                match items.iter().position(|(existing, _)| existing == key) {
                    Some(pos) => {
                        let existing = std::mem::replace(&mut items[pos].1, Node::Null);
                        items[pos].1 = merge(existing, patch_item, &path.key(key.as_str()))?;
                    }
                    None => items.push((key.clone(), patch_item.clone().prune_nulls())),
                }
            }
            Ok(Node::KeyedList { merge_key, items })
        }
        (Node::List(_), Node::List(patch_items)) => Ok(Node::List(
            patch_items.iter().cloned().map(Node::prune_nulls).collect(),
        )),
        (Node::Scalar(_), Node::Scalar(value)) => Ok(Node::Scalar(value.clone())),
        (base, patch) => Err(MergeError {
            path: path.clone(),
            base: base.kind(),
            patch: patch.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn pod(value: Value) -> Node {
        Node::parse(&value, Schema::pod_template().root(), &FieldPath::root()).unwrap()
    }

    fn merged(base: Value, patch: Value) -> Result<Value, MergeError> {
        merge(pod(base), &pod(patch), &FieldPath::root()).map(|node| node.to_value())
    }

    #[test]
    fn env_entries_merge_by_name() {
        let out = merged(
            json!({"spec": {"containers": [{"name": "c", "image": "img", "env": [{"name": "DEFAULT", "value": "value"}]}]}}),
            json!({"spec": {"containers": [{"name": "c", "env": [{"name": "PATCHED", "value": "patched-value"}]}]}}),
        )
        .unwrap();
        assert_eq!(
            out,
            json!({"spec": {"containers": [{"name": "c", "image": "img", "env": [
                {"name": "DEFAULT", "value": "value"},
                {"name": "PATCHED", "value": "patched-value"}
            ]}]}})
        );
    }

    #[test]
    fn matched_element_is_deep_merged_in_place() {
        let out = merged(
            json!({"spec": {"containers": [
                {"name": "first", "image": "a"},
                {"name": "second", "image": "b", "env": [{"name": "X", "value": "1"}]}
            ]}}),
            json!({"spec": {"containers": [
                {"name": "sidecar", "image": "s"},
                {"name": "second", "env": [{"name": "X", "value": "2"}]}
            ]}}),
        )
        .unwrap();
        assert_eq!(
            out,
            json!({"spec": {"containers": [
                {"name": "first", "image": "a"},
                {"name": "second", "image": "b", "env": [{"name": "X", "value": "2"}]},
                {"name": "sidecar", "image": "s"}
            ]}})
        );
    }

    #[test]
    fn anonymous_lists_are_replaced() {
        let out = merged(
            json!({"spec": {"containers": [{"name": "c", "args": ["--a", "--b"]}]}}),
            json!({"spec": {"containers": [{"name": "c", "args": ["--c"]}]}}),
        )
        .unwrap();
        assert_eq!(out["spec"]["containers"][0]["args"], json!(["--c"]));
    }

    #[test]
    fn maps_keep_unpatched_keys() {
        let out = merged(
            json!({"metadata": {"labels": {"app": "agent", "tier": "base"}}}),
            json!({"metadata": {"labels": {"tier": "gpu", "extra": "1"}}}),
        )
        .unwrap();
        assert_eq!(
            out["metadata"]["labels"],
            json!({"app": "agent", "extra": "1", "tier": "gpu"})
        );
    }

    #[test]
    fn ports_merge_per_protocol() {
        let out = merged(
            json!({"spec": {"containers": [{"name": "dns", "ports": [
                {"name": "dns", "containerPort": 53, "protocol": "UDP"},
                {"name": "dns-tcp", "containerPort": 53, "protocol": "TCP"}
            ]}]}}),
            json!({"spec": {"containers": [{"name": "dns", "ports": [
                {"containerPort": 53, "hostPort": 53}
            ]}]}}),
        )
        .unwrap();
        assert_eq!(
            out["spec"]["containers"][0]["ports"],
            json!([
                {"name": "dns", "containerPort": 53, "protocol": "UDP"},
                {"name": "dns-tcp", "containerPort": 53, "protocol": "TCP", "hostPort": 53}
            ])
        );
    }

    #[test]
    fn null_deletes_field() {
        let out = merged(
            json!({"metadata": {"annotations": {"keep": "1", "drop": "2"}}}),
            json!({"metadata": {"annotations": {"drop": null}}}),
        )
        .unwrap();
        assert_eq!(out["metadata"]["annotations"], json!({"keep": "1"}));
    }

    #[test]
    fn shape_conflict_in_free_subtree_reports_path() {
        let err = merged(
            json!({"spec": {"containers": [{"name": "c", "securityContext": {"capabilities": {"add": ["NET_ADMIN"]}}}]}}),
            json!({"spec": {"containers": [{"name": "c", "securityContext": {"capabilities": ["ALL"]}}]}}),
        )
        .unwrap_err();
        assert_eq!(
            err.path.to_string(),
            "spec.containers[c].securityContext.capabilities"
        );
        assert_eq!(err.base, "object");
        assert_eq!(err.patch, "list");
    }
}
