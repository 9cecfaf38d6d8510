//! Validator limits and their layered loading: defaults, then file, then env.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const ENV_PREFIX: &str = "NODE_OVERLAY_LIMITS__";

pub const DEFAULT_MAX_RULES: usize = 10;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorLimits {
    #[serde(alias = "max_rules")]
    pub max_rules: usize,
    #[serde(alias = "max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for ValidatorLimits {
    fn default() -> Self {
        Self {
            max_rules: DEFAULT_MAX_RULES,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize limits: {0}")]
    Deserialize(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("unsupported limit: {0}")]
    UnsupportedKey(String),
}

/// Partial limits as found in a file; absent fields keep the previous layer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LimitsOverlay {
    #[serde(default, alias = "max_rules")]
    max_rules: Option<usize>,
    #[serde(default, alias = "max_payload_bytes")]
    max_payload_bytes: Option<usize>,
}

impl ValidatorLimits {
    /// Applies a limits document. A `limits` section is used when present,
    /// otherwise the whole document.
    pub fn apply_document(&mut self, raw: &str) -> Result<(), ConfigError> {
        let document: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(json_err) => serde_yaml::from_str(raw).map_err(|yaml_err| {
                ConfigError::Deserialize(format!(
                    "json error: {}; yaml error: {}",
                    json_err, yaml_err
                ))
            })?,
        };
        if document.is_null() {
            return Ok(());
        }
        let section = document.get("limits").cloned().unwrap_or(document);
        let overlay: LimitsOverlay = serde_json::from_value(section)
            .map_err(|err| ConfigError::Deserialize(err.to_string()))?;
        if let Some(max_rules) = overlay.max_rules {
            self.max_rules = max_rules;
        }
        if let Some(max_payload_bytes) = overlay.max_payload_bytes {
            self.max_payload_bytes = max_payload_bytes;
        }
        Ok(())
    }

    /// Applies `NODE_OVERLAY_LIMITS__*` style variables from `vars`.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, raw) in vars {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let field = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join(".");
            let slot = match field.as_str() {
                "max_rules" => &mut self.max_rules,
                "max_payload_bytes" => &mut self.max_payload_bytes,
                "" => continue,
                _ => return Err(ConfigError::UnsupportedKey(key)),
            };
            *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.clone(),
                value: raw.clone(),
            })?;
        }
        Ok(())
    }
}

/// Builds limits from defaults, an optional file and the process environment.
/// A path that does not exist is skipped.
pub fn load_limits(path: Option<&Path>) -> Result<ValidatorLimits, ConfigError> {
    let mut limits = ValidatorLimits::default();
    if let Some(path) = path {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            limits.apply_document(&content)?;
        }
    }
    limits.apply_env(env::vars())?;
    Ok(limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_admission_limits() {
        let limits = ValidatorLimits::default();
        assert_eq!(limits.max_rules, 10);
        assert_eq!(limits.max_payload_bytes, 1024);
    }

    #[test]
    fn document_section_overrides_only_given_fields() {
        let mut limits = ValidatorLimits::default();
        limits
            .apply_document("limits:\n  maxRules: 3\nlogging: {level: debug}\n")
            .unwrap();
        assert_eq!(limits.max_rules, 3);
        assert_eq!(limits.max_payload_bytes, 1024);

        limits.apply_document(r#"{"max_payload_bytes": 2048}"#).unwrap();
        assert_eq!(limits.max_payload_bytes, 2048);
    }

    #[test]
    fn env_layer_wins_and_rejects_garbage() {
        let mut limits = ValidatorLimits::default();
        limits
            .apply_env(vars(&[
                ("NODE_OVERLAY_LIMITS__MAX_RULES", "25"),
                ("UNRELATED", "x"),
            ]))
            .unwrap();
        assert_eq!(limits.max_rules, 25);

        let err = limits
            .apply_env(vars(&[("NODE_OVERLAY_LIMITS__MAX_PAYLOAD_BYTES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = limits
            .apply_env(vars(&[("NODE_OVERLAY_LIMITS__TIMEOUT", "1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedKey(_)));
    }

    #[test]
    fn load_limits_reads_file_and_skips_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node-overlay.yaml");
        fs::write(&path, "limits:\n  maxRules: 4\n  maxPayloadBytes: 512\n").unwrap();

        let limits = load_limits(Some(&path)).unwrap();
        assert_eq!(limits.max_rules, 4);
        assert_eq!(limits.max_payload_bytes, 512);

        let fallback = load_limits(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(fallback, ValidatorLimits::default());
    }
}
