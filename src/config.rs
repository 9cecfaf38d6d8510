//! CLI configuration file model

use std::path::PathBuf;

use node_overlay_validator::ValidatorLimits;
use serde::{Deserialize, Serialize};

/// Contents of `node-overlay.yaml`. Every field is optional in the file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Validator ceilings, overridable via `NODE_OVERLAY_LIMITS__*`
    pub limits: ValidatorLimits,
    /// Template used when `--template` is omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    /// Rules file used when `--rules` is omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = serde_yaml::from_str("limits:\n  maxRules: 3\nrules: ./rules.yaml\n").unwrap();
        assert_eq!(config.limits.max_rules, 3);
        assert_eq!(config.limits.max_payload_bytes, 1024);
        assert_eq!(config.rules, Some(PathBuf::from("./rules.yaml")));
        assert_eq!(config.template, None);
    }
}
