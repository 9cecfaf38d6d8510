//! Structural schema used to type documents before merging.
//!
//! The schema decides, per field, whether a list is merged by a key or replaced
//! wholesale, and which JSON shapes are acceptable. Everything below `Free`
//! is untyped and merged by shape alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Boolean,
    Number,
    IntOrString,
    Any,
}

impl ScalarKind {
    pub fn describe(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Number => "number",
            ScalarKind::IntOrString => "number or string",
            ScalarKind::Any => "scalar",
        }
    }
}

/// Fields identifying an element of a keyed list. A field with a default
/// reads as that default when the element omits it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeKey {
    fields: Vec<(String, Option<String>)>,
}

impl MergeKey {
    pub fn new(field: &str) -> Self {
        Self {
            fields: vec![(field.to_string(), None)],
        }
    }

    /// Adds a further key field that falls back to `default` when absent.
    pub fn and_defaulted(mut self, field: &str, default: &str) -> Self {
        self.fields.push((field.to_string(), Some(default.to_string())));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(name, default)| (name.as_str(), default.as_deref()))
    }

    /// Field names joined with `+`, e.g. `containerPort+protocol`.
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldSchema {
    Scalar(ScalarKind),
    /// Closed set of known fields.
    Struct(BTreeMap<String, FieldSchema>),
    /// Open map with uniform values.
    Map(Box<FieldSchema>),
    KeyedList {
        merge_key: MergeKey,
        element: Box<FieldSchema>,
    },
    AtomicList(Box<FieldSchema>),
    Free,
}

impl FieldSchema {
    pub fn describe(&self) -> &'static str {
        match self {
            FieldSchema::Scalar(kind) => kind.describe(),
            FieldSchema::Struct(_) | FieldSchema::Map(_) => "object",
            FieldSchema::KeyedList { .. } | FieldSchema::AtomicList(_) => "list",
            FieldSchema::Free => "any",
        }
    }
}

/// Root schema of a template document.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    root: FieldSchema,
}

impl Schema {
    pub fn new(root: FieldSchema) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &FieldSchema {
        &self.root
    }

    /// Schema that accepts any object and merges purely by shape.
    pub fn free() -> Self {
        Self::new(FieldSchema::Free)
    }

    /// Shared pod template schema.
    pub fn pod_template() -> Arc<Schema> {
        Arc::clone(&*POD_TEMPLATE)
    }
}

static POD_TEMPLATE: Lazy<Arc<Schema>> = Lazy::new(|| Arc::new(pod_template_schema()));

pub fn strct<I, K>(fields: I) -> FieldSchema
where
    I: IntoIterator<Item = (K, FieldSchema)>,
    K: Into<String>,
{
    FieldSchema::Struct(
        fields
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect(),
    )
}

pub fn map_of(value: FieldSchema) -> FieldSchema {
    FieldSchema::Map(Box::new(value))
}

pub fn keyed(merge_key: &str, element: FieldSchema) -> FieldSchema {
    keyed_by(MergeKey::new(merge_key), element)
}

pub fn keyed_by(merge_key: MergeKey, element: FieldSchema) -> FieldSchema {
    FieldSchema::KeyedList {
        merge_key,
        element: Box::new(element),
    }
}

pub fn atomic(element: FieldSchema) -> FieldSchema {
    FieldSchema::AtomicList(Box::new(element))
}

pub fn string() -> FieldSchema {
    FieldSchema::Scalar(ScalarKind::String)
}

pub fn integer() -> FieldSchema {
    FieldSchema::Scalar(ScalarKind::Integer)
}

pub fn boolean() -> FieldSchema {
    FieldSchema::Scalar(ScalarKind::Boolean)
}

fn int_or_string() -> FieldSchema {
    FieldSchema::Scalar(ScalarKind::IntOrString)
}

fn string_map() -> FieldSchema {
    map_of(string())
}

fn quantity_map() -> FieldSchema {
    map_of(int_or_string())
}

fn metadata_schema() -> FieldSchema {
    strct([
        ("name", string()),
        ("generateName", string()),
        ("namespace", string()),
        ("selfLink", string()),
        ("uid", string()),
        ("resourceVersion", string()),
        ("generation", integer()),
        ("creationTimestamp", string()),
        ("deletionTimestamp", string()),
        ("deletionGracePeriodSeconds", integer()),
        ("labels", string_map()),
        ("annotations", string_map()),
        ("ownerReferences", keyed("uid", FieldSchema::Free)),
        ("finalizers", atomic(string())),
        ("managedFields", atomic(FieldSchema::Free)),
    ])
}

fn env_var_schema() -> FieldSchema {
    strct([
        ("name", string()),
        ("value", string()),
        ("valueFrom", FieldSchema::Free),
    ])
}

fn port_schema() -> FieldSchema {
    strct([
        ("name", string()),
        ("containerPort", integer()),
        ("hostPort", integer()),
        ("hostIP", string()),
        ("protocol", string()),
    ])
}

fn resources_schema() -> FieldSchema {
    strct([
        ("limits", quantity_map()),
        ("requests", quantity_map()),
        ("claims", keyed("name", FieldSchema::Free)),
    ])
}

fn container_fields() -> Vec<(&'static str, FieldSchema)> {
    vec![
        ("name", string()),
        ("image", string()),
        ("imagePullPolicy", string()),
        ("command", atomic(string())),
        ("args", atomic(string())),
        ("workingDir", string()),
        ("env", keyed("name", env_var_schema())),
        ("envFrom", atomic(FieldSchema::Free)),
        (
            "ports",
            // The same port may be exposed once per protocol.
            keyed_by(
                MergeKey::new("containerPort").and_defaulted("protocol", "TCP"),
                port_schema(),
            ),
        ),
        ("resources", resources_schema()),
        (
            "resizePolicy",
            atomic(strct([
                ("resourceName", string()),
                ("restartPolicy", string()),
            ])),
        ),
        (
            "volumeMounts",
            keyed(
                "mountPath",
                strct([
                    ("name", string()),
                    ("mountPath", string()),
                    ("subPath", string()),
                    ("subPathExpr", string()),
                    ("readOnly", boolean()),
                    ("recursiveReadOnly", string()),
                    ("mountPropagation", string()),
                ]),
            ),
        ),
        (
            "volumeDevices",
            keyed(
                "devicePath",
                strct([("name", string()), ("devicePath", string())]),
            ),
        ),
        ("livenessProbe", FieldSchema::Free),
        ("readinessProbe", FieldSchema::Free),
        ("startupProbe", FieldSchema::Free),
        ("lifecycle", FieldSchema::Free),
        ("securityContext", FieldSchema::Free),
        ("terminationMessagePath", string()),
        ("terminationMessagePolicy", string()),
        ("stdin", boolean()),
        ("stdinOnce", boolean()),
        ("tty", boolean()),
        ("restartPolicy", string()),
    ]
}

fn container_schema() -> FieldSchema {
    strct(container_fields())
}

fn ephemeral_container_schema() -> FieldSchema {
    let mut fields = container_fields();
    fields.push(("targetContainerName", string()));
    strct(fields)
}

fn pod_spec_schema() -> FieldSchema {
    strct([
        ("containers", keyed("name", container_schema())),
        ("initContainers", keyed("name", container_schema())),
        ("ephemeralContainers", keyed("name", ephemeral_container_schema())),
        (
            "volumes",
            // Volume sources are a union of many shapes; keep them untyped.
            keyed("name", FieldSchema::Free),
        ),
        (
            "imagePullSecrets",
            keyed("name", strct([("name", string())])),
        ),
        (
            "hostAliases",
            keyed(
                "ip",
                strct([("ip", string()), ("hostnames", atomic(string()))]),
            ),
        ),
        ("tolerations", atomic(FieldSchema::Free)),
        ("topologySpreadConstraints", atomic(FieldSchema::Free)),
        (
            "readinessGates",
            atomic(strct([("conditionType", string())])),
        ),
        (
            "schedulingGates",
            keyed("name", strct([("name", string())])),
        ),
        ("resourceClaims", keyed("name", FieldSchema::Free)),
        ("resources", resources_schema()),
        ("overhead", quantity_map()),
        ("os", strct([("name", string())])),
        ("nodeSelector", string_map()),
        ("affinity", FieldSchema::Free),
        ("securityContext", FieldSchema::Free),
        ("dnsConfig", FieldSchema::Free),
        ("nodeName", string()),
        ("hostname", string()),
        ("subdomain", string()),
        ("setHostnameAsFQDN", boolean()),
        ("serviceAccountName", string()),
        ("serviceAccount", string()),
        ("automountServiceAccountToken", boolean()),
        ("enableServiceLinks", boolean()),
        ("shareProcessNamespace", boolean()),
        ("priorityClassName", string()),
        ("priority", integer()),
        ("preemptionPolicy", string()),
        ("schedulerName", string()),
        ("runtimeClassName", string()),
        ("restartPolicy", string()),
        ("dnsPolicy", string()),
        ("hostNetwork", boolean()),
        ("hostPID", boolean()),
        ("hostIPC", boolean()),
        ("hostUsers", boolean()),
        ("terminationGracePeriodSeconds", integer()),
        ("activeDeadlineSeconds", integer()),
    ])
}

fn pod_template_schema() -> Schema {
    Schema::new(strct([
        ("metadata", metadata_schema()),
        ("spec", pod_spec_schema()),
    ]))
}
