use std::path::{Path, PathBuf};
use std::sync::Arc;

use node_overlay_resolver::Resolver;
use node_overlay_validator::RuleValidator;

use crate::config::Config;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    resolver: Resolver,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            resolver: Resolver::default(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn validator(&self) -> RuleValidator {
        RuleValidator::new(self.config.limits)
    }
}
