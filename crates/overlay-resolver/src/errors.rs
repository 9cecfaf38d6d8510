use node_overlay_core_types::{FieldPath, RuleId};
use thiserror::Error;

/// A payload (or base template) that is not a well-formed document for the schema.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("{path}: payload is empty")]
    Empty { path: FieldPath },
    #[error("{path}: payload is not a structural document: {reason}")]
    Unparsable { path: FieldPath, reason: String },
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{path}: unknown field")]
    UnknownField { path: FieldPath },
    #[error("{path}: list element is missing merge key `{key}`")]
    MissingMergeKey { path: FieldPath, key: String },
    #[error("{path}: duplicate value `{value}` for merge key `{key}`")]
    DuplicateMergeKey {
        path: FieldPath,
        key: String,
        value: String,
    },
}

impl PayloadError {
    pub fn path(&self) -> &FieldPath {
        match self {
            PayloadError::Empty { path }
            | PayloadError::Unparsable { path, .. }
            | PayloadError::TypeMismatch { path, .. }
            | PayloadError::UnknownField { path }
            | PayloadError::MissingMergeKey { path, .. }
            | PayloadError::DuplicateMergeKey { path, .. } => path,
        }
    }
}

/// Structural conflict found while folding a patch into the accumulated document.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{path}: cannot merge {patch} into {base}")]
pub struct MergeError {
    pub path: FieldPath,
    pub base: &'static str,
    pub patch: &'static str,
}

/// Failure of a single target's resolution. No partial template is produced.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("base template is invalid: {0}")]
    Template(PayloadError),
    #[error("rule {rule} has an invalid payload: {source}")]
    Payload {
        rule: RuleId,
        #[source]
        source: PayloadError,
    },
    #[error("rule {rule} failed to apply: {source}")]
    Merge {
        rule: RuleId,
        #[source]
        source: MergeError,
    },
}

impl ResolveError {
    pub fn field_path(&self) -> &FieldPath {
        match self {
            ResolveError::Template(err) => err.path(),
            ResolveError::Payload { source, .. } => source.path(),
            ResolveError::Merge { source, .. } => &source.path,
        }
    }

    /// The rule that failed, if the failure is attributable to one.
    pub fn rule(&self) -> Option<&RuleId> {
        match self {
            ResolveError::Template(_) => None,
            ResolveError::Payload { rule, .. } | ResolveError::Merge { rule, .. } => Some(rule),
        }
    }
}

/// Errors surfaced while loading rules, templates or label sets from text.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize {what}: {reason}")]
    Deserialize { what: &'static str, reason: String },
}
