use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::order::MatchedRule;
use crate::rule::Payload;
use crate::template::Template;

const DOMAIN_TAG: &[u8] = b"node-overlay/v1";
const SHORT_LEN: usize = 10;

/// Content digest over a base template and the payloads applied to it, in order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading hex characters, suitable for a revision label value.
    pub fn short(&self) -> &str {
        let hex = self.0.strip_prefix("sha256:").unwrap_or(&self.0);
        &hex[..hex.len().min(SHORT_LEN)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint of `base` overlaid with `ordered` (as produced by the orderer).
/// Target labels are not an input.
pub fn fingerprint(base: &Template, ordered: &[MatchedRule<'_>]) -> Fingerprint {
    fingerprint_payloads(base, ordered.iter().map(|entry| &entry.rule.payload))
}

pub fn fingerprint_payloads<'a, I>(base: &Template, payloads: I) -> Fingerprint
where
    I: IntoIterator<Item = &'a Payload>,
{
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);
    hasher.update(Sha256::digest(base.canonical_bytes()));
    for payload in payloads {
        hasher.update((payload.len() as u64).to_be_bytes());
        hasher.update(Sha256::digest(payload.as_bytes()));
    }
    Fingerprint(format!("sha256:{}", hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn none() -> Vec<&'static Payload> {
        Vec::new()
    }

    fn base() -> Template {
        Template::from_value(json!({"spec": {"containers": [{"name": "c", "image": "base"}]}}))
            .unwrap()
    }

    #[test]
    fn order_of_payloads_matters() {
        let a = Payload::from_bytes("{\"a\":1}");
        let b = Payload::from_bytes("{\"b\":1}");
        let forward = fingerprint_payloads(&base(), [&a, &b]);
        let backward = fingerprint_payloads(&base(), [&b, &a]);
        assert_ne!(forward, backward);
    }

    #[test]
    fn subset_matters() {
        let a = Payload::from_bytes("{\"a\":1}");
        let b = Payload::from_bytes("{\"b\":1}");
        assert_ne!(
            fingerprint_payloads(&base(), [&a]),
            fingerprint_payloads(&base(), [&a, &b])
        );
        assert_ne!(
            fingerprint_payloads(&base(), none()),
            fingerprint_payloads(&base(), [&a])
        );
    }

    #[test]
    fn base_content_matters_but_key_order_does_not() {
        let one = Template::from_value(json!({"metadata": {"labels": {"a": "1", "b": "2"}}})).unwrap();
        let two = Template::from_value(json!({"metadata": {"labels": {"b": "2", "a": "1"}}})).unwrap();
        let other = Template::from_value(json!({"metadata": {"labels": {"a": "1"}}})).unwrap();
        assert_eq!(fingerprint_payloads(&one, none()), fingerprint_payloads(&two, none()));
        assert_ne!(fingerprint_payloads(&one, none()), fingerprint_payloads(&other, none()));
    }

    #[test]
    fn renders_with_algorithm_prefix() {
        let digest = fingerprint_payloads(&base(), none());
        assert!(digest.as_str().starts_with("sha256:"));
        assert_eq!(digest.as_str().len(), "sha256:".len() + 64);
        assert_eq!(digest.short().len(), 10);
        assert!(digest.as_str().contains(digest.short()));
    }
}
