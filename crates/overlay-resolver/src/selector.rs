use std::collections::BTreeMap;
use std::fmt;

use node_overlay_core_types::LabelSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Label query: conjunction of equality matches and set-based requirements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
    /// Kept verbatim so admission can report it; never matches.
    Unknown(String),
}

impl SelectorOperator {
    pub fn as_str(&self) -> &str {
        match self {
            SelectorOperator::In => "In",
            SelectorOperator::NotIn => "NotIn",
            SelectorOperator::Exists => "Exists",
            SelectorOperator::DoesNotExist => "DoesNotExist",
            SelectorOperator::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for SelectorOperator {
    fn from(raw: &str) -> Self {
        match raw {
            "In" => SelectorOperator::In,
            "NotIn" => SelectorOperator::NotIn,
            "Exists" => SelectorOperator::Exists,
            "DoesNotExist" => SelectorOperator::DoesNotExist,
            other => SelectorOperator::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for SelectorOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SelectorOperator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SelectorOperator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SelectorOperator::from(raw.as_str()))
    }
}

impl LabelSelector {
    pub fn with_labels<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            match_labels: labels
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            match_expressions: Vec::new(),
        }
    }

    pub fn with_expression(
        mut self,
        key: impl Into<String>,
        operator: SelectorOperator,
        values: &[&str],
    ) -> Self {
        self.match_expressions.push(LabelSelectorRequirement {
            key: key.into(),
            operator,
            values: values.iter().map(|value| value.to_string()).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }

    /// A present selector without requirements matches every target.
    pub fn matches(&self, labels: &LabelSet) -> bool {
        self.match_labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
            && self
                .match_expressions
                .iter()
                .all(|requirement| requirement.matches(labels))
    }
}

impl LabelSelectorRequirement {
    pub fn matches(&self, labels: &LabelSet) -> bool {
        let current = labels.get(&self.key);
        match &self.operator {
            SelectorOperator::In => current.is_some_and(|value| self.values.contains(value)),
            SelectorOperator::NotIn => !current.is_some_and(|value| self.values.contains(value)),
            SelectorOperator::Exists => current.is_some(),
            SelectorOperator::DoesNotExist => current.is_none(),
            SelectorOperator::Unknown(_) => false,
        }
    }
}

/// Whether a rule's selector admits the target. An absent selector never matches.
pub fn matches(labels: &LabelSet, selector: Option<&LabelSelector>) -> bool {
    selector.is_some_and(|selector| selector.matches(labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(pairs: &[(&str, &str)]) -> LabelSet {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn absent_selector_never_matches() {
        assert!(!matches(&node(&[("node-type", "special")]), None));
        assert!(!matches(&LabelSet::new(), None));
    }

    #[test]
    fn empty_selector_matches_everything() {
        assert!(matches(&LabelSet::new(), Some(&LabelSelector::default())));
    }

    #[test]
    fn equality_requires_exact_value() {
        let selector = LabelSelector::with_labels([("node-type", "special")]);
        assert!(selector.matches(&node(&[("node-type", "special"), ("zone", "a")])));
        assert!(!selector.matches(&node(&[("node-type", "regular")])));
        assert!(!selector.matches(&node(&[("zone", "a")])));
    }

    #[test]
    fn set_based_requirements() {
        let labels = node(&[("disk-type", "ssd"), ("zone", "a")]);
        let in_sel = LabelSelector::default().with_expression(
            "disk-type",
            SelectorOperator::In,
            &["ssd", "nvme"],
        );
        assert!(in_sel.matches(&labels));

        let not_in = LabelSelector::default().with_expression(
            "disk-type",
            SelectorOperator::NotIn,
            &["ssd"],
        );
        assert!(!not_in.matches(&labels));
        assert!(not_in.matches(&node(&[("zone", "a")])));

        let exists = LabelSelector::default().with_expression("zone", SelectorOperator::Exists, &[]);
        assert!(exists.matches(&labels));

        let absent =
            LabelSelector::default().with_expression("gpu", SelectorOperator::DoesNotExist, &[]);
        assert!(absent.matches(&labels));
        assert!(!absent.matches(&node(&[("gpu", "true")])));
    }

    #[test]
    fn unknown_operator_fails_closed() {
        let selector: LabelSelector = serde_json::from_value(serde_json::json!({
            "matchExpressions": [{"key": "zone", "operator": "Contains", "values": ["a"]}]
        }))
        .unwrap();
        assert_eq!(
            selector.match_expressions[0].operator,
            SelectorOperator::Unknown("Contains".into())
        );
        assert!(!selector.matches(&node(&[("zone", "a")])));
    }

    #[test]
    fn equality_and_expressions_are_conjunctive() {
        let selector = LabelSelector::with_labels([("node-type", "special")]).with_expression(
            "zone",
            SelectorOperator::In,
            &["a"],
        );
        assert!(selector.matches(&node(&[("node-type", "special"), ("zone", "a")])));
        assert!(!selector.matches(&node(&[("node-type", "special"), ("zone", "b")])));
    }
}
