//! Text and file loaders for rules, templates and target label sets.
//!
//! Every document is tried as JSON first and then as YAML.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use node_overlay_core_types::LabelSet;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::LoadError;
use crate::rule::Rule;
use crate::template::Template;

/// Accepted shapes of a rules document.
#[derive(Deserialize)]
#[serde(untagged)]
enum RulesDocument {
    List(Vec<Rule>),
    Wrapped {
        #[serde(alias = "rules")]
        patches: Vec<Rule>,
    },
    Spec {
        spec: Box<RulesDocument>,
    },
}

impl RulesDocument {
    fn into_rules(self) -> Vec<Rule> {
        match self {
            RulesDocument::List(rules) | RulesDocument::Wrapped { patches: rules } => rules,
            RulesDocument::Spec { spec } => spec.into_rules(),
        }
    }
}

/// Parses a rule list: a bare list, `{patches: [...]}`, or a resource with
/// `spec.patches`.
pub fn parse_rules_str(raw: &str) -> Result<Vec<Rule>, LoadError> {
    parse_document::<RulesDocument>(raw, "rules").map(RulesDocument::into_rules)
}

pub fn load_rules_from_path(path: impl AsRef<Path>) -> Result<Vec<Rule>, LoadError> {
    parse_rules_str(&read_to_string(path)?)
}

/// Parses a template; a resource wrapping it under `spec.template` is unwrapped.
pub fn parse_template_str(raw: &str) -> Result<Template, LoadError> {
    let value: Value = parse_document(raw, "template")?;
    let document = match value.pointer("/spec/template") {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => value,
    };
    Template::from_value(document).map_err(|err| LoadError::Deserialize {
        what: "template",
        reason: err.to_string(),
    })
}

pub fn load_template_from_path(path: impl AsRef<Path>) -> Result<Template, LoadError> {
    parse_template_str(&read_to_string(path)?)
}

/// Parses a label mapping, or a node resource carrying `metadata.labels`.
pub fn parse_labels_str(raw: &str) -> Result<LabelSet, LoadError> {
    let value: Value = parse_document(raw, "labels")?;
    let labels = value.pointer("/metadata/labels").cloned().unwrap_or(value);
    serde_json::from_value(labels).map_err(|err| LoadError::Deserialize {
        what: "labels",
        reason: err.to_string(),
    })
}

pub fn load_labels_from_path(path: impl AsRef<Path>) -> Result<LabelSet, LoadError> {
    parse_labels_str(&read_to_string(path)?)
}

/// Parses a mapping of target name to label set.
pub fn parse_targets_str(raw: &str) -> Result<Vec<(String, LabelSet)>, LoadError> {
    let targets: BTreeMap<String, LabelSet> = parse_document(raw, "targets")?;
    Ok(targets.into_iter().collect())
}

pub fn load_targets_from_path(path: impl AsRef<Path>) -> Result<Vec<(String, LabelSet)>, LoadError> {
    parse_targets_str(&read_to_string(path)?)
}

fn read_to_string(path: impl AsRef<Path>) -> Result<String, LoadError> {
    let mut file = File::open(path.as_ref())?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    Ok(buf)
}

fn parse_document<T: DeserializeOwned>(raw: &str, what: &'static str) -> Result<T, LoadError> {
    match serde_json::from_str(raw) {
        Ok(parsed) => Ok(parsed),
        Err(json_err) => serde_yaml::from_str(raw).map_err(|yaml_err| LoadError::Deserialize {
            what,
            reason: format!("json error: {}; yaml error: {}", json_err, yaml_err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_accept_wrapped_and_resource_shapes() {
        let bare = parse_rules_str(
            r#"
- selector:
    matchLabels: {node-type: special}
  priority: 100
  patch:
    spec:
      containers:
        - name: agent
          image: special
"#,
        )
        .unwrap();
        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].priority, crate::rule::Priority::from(100));

        let resource = parse_rules_str(
            r#"
apiVersion: apps/v1beta1
kind: DaemonSet
spec:
  patches:
    - selector: {matchLabels: {a: b}}
      patch: '{"spec":{"nodeName":"x"}}'
"#,
        )
        .unwrap();
        assert_eq!(resource.len(), 1);
        assert!(!resource[0].payload.is_empty());
    }

    #[test]
    fn template_is_unwrapped_from_workload() {
        let template = parse_template_str(
            r#"{"spec": {"template": {"spec": {"containers": [{"name": "a", "image": "i"}]}}}}"#,
        )
        .unwrap();
        assert_eq!(template.container("a").unwrap()["image"], "i");
    }

    #[test]
    fn labels_from_node_resource() {
        let labels = parse_labels_str(
            r#"
kind: Node
metadata:
  name: worker-1
  labels:
    node-type: special
"#,
        )
        .unwrap();
        assert_eq!(labels.get("node-type").map(String::as_str), Some("special"));
    }

    #[test]
    fn reports_both_decoder_errors() {
        let err = parse_rules_str("{not: [valid").unwrap_err();
        assert!(err.to_string().contains("json error"));
        assert!(err.to_string().contains("yaml error"));
    }
}
