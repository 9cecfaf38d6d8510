//! Per-node overlay resolution for pod templates.
//!
//! Rules carrying a label selector, a priority and a patch payload are filtered
//! against a node's labels, ordered by `(priority, declaration index)` and
//! deep-merged into a copy of the base template. Named lists (containers, env,
//! ports, ...) merge by key; anonymous lists are replaced. A fingerprint over the
//! base and the applied payloads feeds external revision tracking.

pub mod errors;
pub mod fingerprint;
pub mod loader;
pub mod merge;
pub mod node;
pub mod order;
pub mod pipeline;
pub mod rule;
pub mod schema;
pub mod selector;
pub mod template;

pub use errors::{LoadError, MergeError, PayloadError, ResolveError};
pub use fingerprint::{fingerprint, fingerprint_payloads, Fingerprint};
pub use loader::{
    load_labels_from_path, load_rules_from_path, load_targets_from_path, load_template_from_path,
    parse_labels_str, parse_rules_str, parse_targets_str, parse_template_str,
};
pub use node::Node;
pub use order::{order, select, MatchedRule};
pub use pipeline::{resolve, Resolution, Resolver, TargetResolution};
pub use rule::{Payload, Priority, Rule};
pub use schema::{FieldSchema, MergeKey, ScalarKind, Schema};
pub use selector::{LabelSelector, LabelSelectorRequirement, SelectorOperator};
pub use template::Template;

pub use node_overlay_core_types::{FieldPath, LabelSet, RuleId};
