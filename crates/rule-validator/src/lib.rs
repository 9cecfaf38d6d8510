//! Validation of overlay rule collections before they are accepted.
//!
//! Every check runs independently and reports structured [`Violation`]s; the
//! caller decides whether to reject the collection.

pub mod config;
pub mod labels;
pub mod validate;
pub mod violation;

pub use config::{load_limits, ConfigError, ValidatorLimits, ENV_PREFIX};
pub use labels::{validate_label_key, validate_label_value};
pub use validate::{validate_rules, RuleValidator};
pub use violation::{Violation, ViolationKind};
