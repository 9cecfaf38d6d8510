//! Label key and value syntax, as enforced by the cluster API server.

use once_cell::sync::Lazy;
use regex::Regex;

const NAME_MAX_LEN: usize = 63;
const PREFIX_MAX_LEN: usize = 253;

static QUALIFIED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("static label name pattern")
});

static DNS_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("static dns subdomain pattern")
});

/// Checks `[prefix/]name`; the error describes the first problem found.
pub fn validate_label_key(key: &str) -> Result<(), String> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            return Err("prefix part must be non-empty".into());
        }
        if prefix.len() > PREFIX_MAX_LEN {
            return Err(format!(
                "prefix part must be no more than {PREFIX_MAX_LEN} characters"
            ));
        }
        if !DNS_SUBDOMAIN.is_match(prefix) {
            return Err(
                "prefix part must be a lowercase DNS subdomain (e.g. 'example.com')".into(),
            );
        }
    }

    if name.is_empty() {
        return Err("name part must be non-empty".into());
    }
    if name.len() > NAME_MAX_LEN {
        return Err(format!(
            "name part must be no more than {NAME_MAX_LEN} characters"
        ));
    }
    if !QUALIFIED_NAME.is_match(name) {
        return Err("name part must consist of alphanumeric characters, '-', '_' or '.', \
                    and must start and end with an alphanumeric character"
            .into());
    }
    Ok(())
}

/// Label values may be empty; otherwise they follow the name-part rules.
pub fn validate_label_value(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > NAME_MAX_LEN {
        return Err(format!("must be no more than {NAME_MAX_LEN} characters"));
    }
    if !QUALIFIED_NAME.is_match(value) {
        return Err("a valid label must be an empty string or consist of alphanumeric \
                    characters, '-', '_' or '.', and must start and end with an \
                    alphanumeric character"
            .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_keys() {
        for key in [
            "node-type",
            "kubernetes.io/hostname",
            "topology.kubernetes.io/zone",
            "a",
            "disk_type.v2",
        ] {
            assert_eq!(validate_label_key(key), Ok(()), "{key}");
        }
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(validate_label_key("invalid-key-").is_err());
        assert!(validate_label_key("-leading").is_err());
        assert!(validate_label_key("").is_err());
        assert!(validate_label_key("/name").is_err());
        assert!(validate_label_key("Example.COM/name").is_err());
        assert!(validate_label_key("example.com/").is_err());
        assert!(validate_label_key(&"k".repeat(64)).is_err());
        assert!(validate_label_key(&format!("{}/name", "a".repeat(254))).is_err());
    }

    #[test]
    fn values_allow_empty_but_not_garbage() {
        assert_eq!(validate_label_value(""), Ok(()));
        assert_eq!(validate_label_value("ssd"), Ok(()));
        assert!(validate_label_value("has space").is_err());
        assert!(validate_label_value("trailing.").is_err());
        assert!(validate_label_value(&"v".repeat(64)).is_err());
    }
}
