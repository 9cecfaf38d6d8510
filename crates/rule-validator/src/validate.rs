use std::collections::HashMap;
use std::sync::Arc;

use node_overlay_core_types::FieldPath;
use node_overlay_resolver::{
    LabelSelector, LabelSelectorRequirement, PayloadError, Priority, Rule, Schema,
    SelectorOperator,
};
use tracing::{debug, warn};

use crate::config::ValidatorLimits;
use crate::labels::{validate_label_key, validate_label_value};
use crate::violation::{Violation, ViolationKind};

/// Checks rule collections against limits and a template schema.
#[derive(Clone, Debug)]
pub struct RuleValidator {
    limits: ValidatorLimits,
    schema: Arc<Schema>,
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new(ValidatorLimits::default())
    }
}

impl RuleValidator {
    pub fn new(limits: ValidatorLimits) -> Self {
        Self {
            limits,
            schema: Schema::pod_template(),
        }
    }

    pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = schema;
        self
    }

    pub fn limits(&self) -> &ValidatorLimits {
        &self.limits
    }

    /// Validates rules stored under `spec.patches`.
    pub fn validate(&self, rules: &[Rule]) -> Vec<Violation> {
        self.validate_at(rules, &FieldPath::new(["spec", "patches"]))
    }

    /// Runs every check and returns all violations, with fields relative to `root`.
    pub fn validate_at(&self, rules: &[Rule], root: &FieldPath) -> Vec<Violation> {
        let mut violations = Vec::new();

        if rules.len() > self.limits.max_rules {
            violations.push(Violation::new(
                root.clone(),
                ViolationKind::LimitExceeded,
                format!(
                    "must have at most {} patches, got {}",
                    self.limits.max_rules,
                    rules.len()
                ),
            ));
        }

        let mut names: HashMap<&str, usize> = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            let path = root.index(index);
            self.check_selector(rule.selector.as_ref(), &path.child("selector"), &mut violations);
            self.check_payload(rule, &path.child("patch"), &mut violations);

            self.check_priority(&rule.priority, &path.child("priority"), &mut violations);

            if let Some(name) = rule.name.as_deref() {
                if let Some(first) = names.get(name) {
                    violations.push(Violation::new(
                        path.child("name"),
                        ViolationKind::Duplicate,
                        format!("name `{name}` is already used by patch {first}"),
                    ));
                } else {
                    names.insert(name, index);
                }
            }
        }

        if violations.is_empty() {
            debug!(target: "node-overlay", rules = rules.len(), "rules accepted");
        } else {
            for violation in &violations {
                debug!(target: "node-overlay", field = %violation.field, kind = %violation.kind, "{}", violation.message);
            }
            warn!(
                target: "node-overlay",
                rules = rules.len(),
                violations = violations.len(),
                "rules rejected"
            );
        }
        violations
    }

    fn check_selector(
        &self,
        selector: Option<&LabelSelector>,
        path: &FieldPath,
        out: &mut Vec<Violation>,
    ) {
        let Some(selector) = selector else {
            out.push(Violation::new(
                path.clone(),
                ViolationKind::Selector,
                "selector is required",
            ));
            return;
        };

        let labels_path = path.child("matchLabels");
        for (key, value) in &selector.match_labels {
            let entry = labels_path.key(key.as_str());
            if let Err(reason) = validate_label_key(key) {
                out.push(Violation::new(
                    entry.clone(),
                    ViolationKind::Selector,
                    format!("invalid label key `{key}`: {reason}"),
                ));
            }
            if let Err(reason) = validate_label_value(value) {
                out.push(Violation::new(
                    entry,
                    ViolationKind::Selector,
                    format!("invalid label value `{value}`: {reason}"),
                ));
            }
        }

        let expressions_path = path.child("matchExpressions");
        for (index, requirement) in selector.match_expressions.iter().enumerate() {
            check_requirement(requirement, &expressions_path.index(index), out);
        }
    }

    fn check_payload(&self, rule: &Rule, path: &FieldPath, out: &mut Vec<Violation>) {
        let payload = &rule.payload;
        if payload.is_empty() {
            out.push(Violation::new(
                path.clone(),
                ViolationKind::Payload,
                "patch is required",
            ));
            return;
        }

        if payload.len() > self.limits.max_payload_bytes {
            out.push(Violation::new(
                path.clone(),
                ViolationKind::LimitExceeded,
                format!(
                    "must be at most {} bytes, got {}",
                    self.limits.max_payload_bytes,
                    payload.len()
                ),
            ));
        }

        let document = match payload.to_document(path) {
            Ok(document) => document,
            Err(err) => {
                out.push(payload_violation(&err));
                return;
            }
        };
        if document.is_null() || document.as_object().is_some_and(|map| map.is_empty()) {
            out.push(Violation::new(
                path.clone(),
                ViolationKind::Payload,
                "patch must not be empty",
            ));
            return;
        }
        if let Err(err) = payload.parse(&self.schema, path) {
            out.push(payload_violation(&err));
        }
    }

    fn check_priority(&self, priority: &Priority, path: &FieldPath, out: &mut Vec<Violation>) {
        let message = match priority.value() {
            Some(value) if i32::try_from(value).is_ok() => return,
            Some(value) => format!("must be between {} and {}, got {}", i32::MIN, i32::MAX, value),
            None => format!("must be an integer, got {priority}"),
        };
        out.push(Violation::new(path.clone(), ViolationKind::Priority, message));
    }
}

fn check_requirement(requirement: &LabelSelectorRequirement, path: &FieldPath, out: &mut Vec<Violation>) {
    if let Err(reason) = validate_label_key(&requirement.key) {
        out.push(Violation::new(
            path.child("key"),
            ViolationKind::Selector,
            format!("invalid label key `{}`: {reason}", requirement.key),
        ));
    }

    let values_path = path.child("values");
    match &requirement.operator {
        SelectorOperator::In | SelectorOperator::NotIn => {
            if requirement.values.is_empty() {
                out.push(Violation::new(
                    values_path.clone(),
                    ViolationKind::Selector,
                    format!(
                        "must be specified when operator is {}",
                        requirement.operator.as_str()
                    ),
                ));
            }
        }
        SelectorOperator::Exists | SelectorOperator::DoesNotExist => {
            if !requirement.values.is_empty() {
                out.push(Violation::new(
                    values_path.clone(),
                    ViolationKind::Selector,
                    format!(
                        "may not be specified when operator is {}",
                        requirement.operator.as_str()
                    ),
                ));
            }
        }
        SelectorOperator::Unknown(op) => {
            out.push(Violation::new(
                path.child("operator"),
                ViolationKind::Selector,
                format!("unsupported operator `{op}`; expected In, NotIn, Exists or DoesNotExist"),
            ));
        }
    }

    for (index, value) in requirement.values.iter().enumerate() {
        if let Err(reason) = validate_label_value(value) {
            out.push(Violation::new(
                values_path.index(index),
                ViolationKind::Selector,
                format!("invalid label value `{value}`: {reason}"),
            ));
        }
    }
}

fn payload_violation(err: &PayloadError) -> Violation {
    let message = match err {
        PayloadError::Empty { .. } => "patch is required".to_string(),
        PayloadError::Unparsable { reason, .. } => format!("patch is not valid JSON or YAML: {reason}"),
        PayloadError::TypeMismatch { expected, found, .. } => {
            format!("expected {expected}, found {found}")
        }
        PayloadError::UnknownField { .. } => "unknown field".to_string(),
        PayloadError::MissingMergeKey { key, .. } => format!("list element is missing `{key}`"),
        PayloadError::DuplicateMergeKey { key, value, .. } => {
            format!("duplicate `{key}` value `{value}`")
        }
    };
    Violation::new(err.path().clone(), ViolationKind::Payload, message)
}

/// Validates rules under `root` with default limits and the pod template schema.
pub fn validate_rules(rules: &[Rule], root: &FieldPath) -> Vec<Violation> {
    RuleValidator::default().validate_at(rules, root)
}
