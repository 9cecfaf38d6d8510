use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Label set of a target (node). Sorted so iteration is deterministic.
pub type LabelSet = BTreeMap<String, String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelParseError {
    #[error("label entry `{0}` is not of the form key=value")]
    MissingSeparator(String),
    #[error("label entry `{0}` has an empty key")]
    EmptyKey(String),
    #[error("label `{0}` is specified more than once")]
    DuplicateKey(String),
}

/// Parses `key=value,key2=value2` into a label set.
///
/// Whitespace around entries is ignored and an empty input yields an empty set.
pub fn parse_label_set(raw: &str) -> Result<LabelSet, LabelParseError> {
    let mut labels = LabelSet::new();
    for token in raw.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(LabelParseError::MissingSeparator(trimmed.to_string()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(LabelParseError::EmptyKey(trimmed.to_string()));
        }
        if labels
            .insert(key.to_string(), value.trim().to_string())
            .is_some()
        {
            return Err(LabelParseError::DuplicateKey(key.to_string()));
        }
    }
    Ok(labels)
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Location of a field inside a document, rendered like
/// `spec.containers[agent].env[HTTP_PROXY]`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The document root. Renders as `<root>`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: fields
                .into_iter()
                .map(|field| PathSegment::Field(field.into()))
                .collect(),
        }
    }

    pub fn child(&self, field: impl Into<String>) -> Self {
        self.with(PathSegment::Field(field.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(PathSegment::Index(index))
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.with(PathSegment::Key(key.into()))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn with(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if idx == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde-full")]
impl serde::Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Identity of a rule within its collection: declaration index plus the optional
/// user-assigned name.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RuleId {
    pub index: usize,
    pub name: Option<String>,
}

impl RuleId {
    pub fn new(index: usize, name: Option<String>) -> Self {
        Self { index, name }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "#{}", self.index),
        }
    }
}
