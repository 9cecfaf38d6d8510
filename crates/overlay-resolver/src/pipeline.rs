use std::sync::Arc;

use node_overlay_core_types::{FieldPath, LabelSet, RuleId};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::ResolveError;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::merge::merge;
use crate::node::Node;
use crate::order::{order, select, MatchedRule};
use crate::rule::Rule;
use crate::schema::Schema;
use crate::template::Template;

/// Effective template for one target.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolution {
    pub template: Template,
    pub applied: Vec<RuleId>,
    pub fingerprint: Fingerprint,
}

/// Outcome for one entry of a batch; failures stay local to their target.
#[derive(Clone, Debug)]
pub struct TargetResolution<K> {
    pub target: K,
    pub outcome: Result<Resolution, ResolveError>,
}

/// Resolves templates against a fixed schema. Holds no per-call state.
#[derive(Clone, Debug)]
pub struct Resolver {
    schema: Arc<Schema>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Schema::pod_template())
    }
}

impl Resolver {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Matched rules for `labels`, in application order.
    pub fn plan<'a>(&self, labels: &LabelSet, rules: &'a [Rule]) -> Vec<MatchedRule<'a>> {
        order(select(labels, rules))
    }

    pub fn resolve(
        &self,
        base: &Template,
        labels: &LabelSet,
        rules: &[Rule],
    ) -> Result<Resolution, ResolveError> {
        let base_node = Node::parse(base.as_value(), self.schema.root(), &FieldPath::root())
            .map_err(ResolveError::Template)?;
        let plan = self.plan(labels, rules);
        let digest = fingerprint(base, &plan);
        debug!(
            target: "node-overlay",
            matched = plan.len(),
            total = rules.len(),
            fingerprint = %digest,
            "planned overlay"
        );

        // Output is always re-rendered, matched or not: nulls dropped, keys sorted.
        let mut accumulated = base_node;
        for entry in &plan {
            accumulated = self.apply(accumulated, entry).map_err(|err| {
                warn!(
                    target: "node-overlay",
                    rule = %entry.id(),
                    path = %err.field_path(),
                    "overlay aborted: {err}"
                );
                err
            })?;
        }

        let template =
            Template::from_value(accumulated.to_value()).map_err(ResolveError::Template)?;
        Ok(Resolution {
            template,
            applied: plan.iter().map(MatchedRule::id).collect(),
            fingerprint: digest,
        })
    }

    /// Resolves every target independently, in parallel.
    pub fn resolve_many<K>(
        &self,
        base: &Template,
        targets: &[(K, LabelSet)],
        rules: &[Rule],
    ) -> Vec<TargetResolution<K>>
    where
        K: Clone + Send + Sync,
    {
        targets
            .par_iter()
            .map(|(target, labels)| TargetResolution {
                target: target.clone(),
                outcome: self.resolve(base, labels, rules),
            })
            .collect()
    }

    fn apply(&self, accumulated: Node, entry: &MatchedRule<'_>) -> Result<Node, ResolveError> {
        let patch = entry
            .rule
            .payload
            .parse(&self.schema, &FieldPath::root())
            .map_err(|source| ResolveError::Payload {
                rule: entry.id(),
                source,
            })?;
        debug!(target: "node-overlay", rule = %entry.id(), priority = %entry.rule.priority, "applying overlay");
        merge(accumulated, &patch, &FieldPath::root()).map_err(|source| ResolveError::Merge {
            rule: entry.id(),
            source,
        })
    }
}

/// Resolves with the built-in pod template schema.
pub fn resolve(
    base: &Template,
    labels: &LabelSet,
    rules: &[Rule],
) -> Result<Resolution, ResolveError> {
    Resolver::default().resolve(base, labels, rules)
}
