use std::fmt;

use node_overlay_core_types::FieldPath;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationKind {
    /// Missing or malformed selector.
    Selector,
    /// Empty, unparsable or schema-incompatible payload.
    Payload,
    /// Collection or payload over its configured ceiling.
    LimitExceeded,
    /// Priority outside the signed 32-bit range.
    Priority,
    /// Rule name used more than once.
    Duplicate,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Selector => "selector",
            ViolationKind::Payload => "payload",
            ViolationKind::LimitExceeded => "limitExceeded",
            ViolationKind::Priority => "priority",
            ViolationKind::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected aspect of a rule collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: FieldPath,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(field: FieldPath, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
