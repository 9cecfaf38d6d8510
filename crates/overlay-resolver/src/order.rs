use node_overlay_core_types::{LabelSet, RuleId};

use crate::rule::Rule;
use crate::selector;

/// A rule admitted for a target, with its declaration index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchedRule<'a> {
    pub index: usize,
    pub rule: &'a Rule,
}

impl MatchedRule<'_> {
    pub fn id(&self) -> RuleId {
        self.rule.id(self.index)
    }
}

/// Rules whose selector admits `labels`, in declaration order.
pub fn select<'a>(labels: &LabelSet, rules: &'a [Rule]) -> Vec<MatchedRule<'a>> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| selector::matches(labels, rule.selector.as_ref()))
        .map(|(index, rule)| MatchedRule { index, rule })
        .collect()
}

/// Application order: priority ascending, then declaration index ascending.
/// The last rule applied wins scalar conflicts. Malformed priorities order as 0.
pub fn order(mut matched: Vec<MatchedRule<'_>>) -> Vec<MatchedRule<'_>> {
    matched.sort_by_key(|entry| (entry.rule.priority.sort_key(), entry.index));
    matched
}
