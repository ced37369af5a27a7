//! Strongly typed task schema definitions shared by the validation engine and the CLI.
//!
//! The models mirror the authoring shape of a task document: declarations of parameters,
//! workspaces, resources, and results, followed by an ordered list of container steps. Field
//! names follow the camelCase convention used by task manifests. Authoring order is preserved
//! everywhere so validation errors can point at the exact index an author wrote.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub mod merge;

/// Default parent directory for workspaces and input resources.
pub const WORKSPACE_ROOT: &str = "/workspace";

/// Default parent directory for output resources.
pub const OUTPUT_ROOT: &str = "/workspace/output";

/// Default parent directory for result files.
pub const RESULTS_ROOT: &str = "/tekton/results";

/// A complete task document as authored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskDocument {
    /// API group and version, for example `tekton.dev/v1beta1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Resource kind, normally `Task`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Object metadata; only the name participates in validation.
    #[serde(default)]
    pub metadata: ObjectMetadata,
    /// The task specification under validation.
    #[serde(default)]
    pub spec: TaskSpec,
}

/// Object metadata attached to a task document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ObjectMetadata {
    /// Object name.
    #[serde(default)]
    pub name: String,
    /// Free-form labels; carried through untouched.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,
}

/// The root value under validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    /// Optional descriptive copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared parameters in authoring order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    /// Declared workspaces in authoring order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceDeclaration>,
    /// Declared input and output resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<TaskResources>,
    /// Declared results in authoring order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TaskResult>,
    /// Ordered container steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    /// Defaults merged into every step before structural checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_template: Option<Step>,
    /// Volumes made available to the steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

impl TaskSpec {
    /// Returns true when nothing at all has been authored.
    pub fn is_empty(&self) -> bool {
        self == &TaskSpec::default()
    }

    /// Declared input resources, or an empty slice when no resources block exists.
    pub fn input_resources(&self) -> &[TaskResource] {
        self.resources.as_ref().map(|resources| resources.inputs.as_slice()).unwrap_or_default()
    }

    /// Declared output resources, or an empty slice when no resources block exists.
    pub fn output_resources(&self) -> &[TaskResource] {
        self.resources.as_ref().map(|resources| resources.outputs.as_slice()).unwrap_or_default()
    }
}

/// Primitive type of a declared parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// A single text value.
    #[default]
    String,
    /// An ordered list of text values.
    Array,
}

impl ParamType {
    /// Lowercase name as written in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Array => "array",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete parameter value, either a string or an array of strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ParamValue {
    /// Scalar text.
    String(String),
    /// Ordered list of text values.
    Array(Vec<String>),
}

impl ParamValue {
    /// The parameter type this value satisfies.
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::String(_) => ParamType::String,
            ParamValue::Array(_) => ParamType::Array,
        }
    }
}

/// Declares a single task parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamSpec {
    /// Unique parameter name.
    pub name: String,
    /// Declared type; `string` when omitted.
    #[serde(default)]
    pub r#type: ParamType,
    /// Optional descriptive copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when the caller supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
}

/// Declares a workspace the task expects to be bound at run time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDeclaration {
    /// Unique workspace name.
    pub name: String,
    /// Optional descriptive copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicit mount path; defaults to `/workspace/<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
    /// Whether steps may only read from the workspace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl WorkspaceDeclaration {
    /// The path the workspace is mounted at inside every step.
    pub fn effective_mount_path(&self) -> String {
        match &self.mount_path {
            Some(mount_path) if !mount_path.is_empty() => mount_path.clone(),
            _ => format!("{WORKSPACE_ROOT}/{}", self.name),
        }
    }
}

/// Input and output resource declarations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TaskResources {
    /// Resources materialized before the steps run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<TaskResource>,
    /// Resources produced by the steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<TaskResource>,
}

/// Declares a single input or output resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskResource {
    /// Resource name, unique within its direction.
    pub name: String,
    /// Resource type tag such as `git` or `image`. Kept as text so unknown tags survive decoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    /// Optional descriptive copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Path the resource is placed at; relative paths live under `/workspace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    /// Whether the resource may be omitted by the caller.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Which side of the task a resource sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDirection {
    Input,
    Output,
}

impl TaskResource {
    /// The path the resource is materialized at.
    ///
    /// An absolute `targetPath` is used verbatim, a relative one is joined under
    /// `/workspace`, and without one inputs land in `/workspace/<name>` and outputs in
    /// `/workspace/output/<name>`.
    pub fn effective_path(&self, direction: ResourceDirection) -> String {
        match self.target_path.as_deref() {
            Some(target_path) if target_path.starts_with('/') => target_path.to_string(),
            Some(target_path) if !target_path.is_empty() => crate::paths::join_clean(WORKSPACE_ROOT, target_path),
            _ => {
                let root = match direction {
                    ResourceDirection::Input => WORKSPACE_ROOT,
                    ResourceDirection::Output => OUTPUT_ROOT,
                };
                crate::paths::join_clean(root, &self.name)
            }
        }
    }

    /// The resource type tag when it names a known type.
    pub fn resource_type(&self) -> Option<ResourceType> {
        self.r#type.as_deref().and_then(ResourceType::parse)
    }
}

/// Known resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Git,
    Image,
    Cluster,
    Storage,
    PullRequest,
    CloudEvent,
}

impl ResourceType {
    /// Every known resource type.
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Git,
        ResourceType::Image,
        ResourceType::Cluster,
        ResourceType::Storage,
        ResourceType::PullRequest,
        ResourceType::CloudEvent,
    ];

    /// Parses a manifest type tag. Returns `None` for unknown tags.
    pub fn parse(tag: &str) -> Option<ResourceType> {
        ResourceType::ALL.into_iter().find(|resource_type| resource_type.as_str() == tag)
    }

    /// Tag as written in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Git => "git",
            ResourceType::Image => "image",
            ResourceType::Cluster => "cluster",
            ResourceType::Storage => "storage",
            ResourceType::PullRequest => "pullrequest",
            ResourceType::CloudEvent => "cloudevent",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares a result file written by the steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskResult {
    /// Unique result name.
    pub name: String,
    /// Optional descriptive copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicit result file path; defaults to `/tekton/results/<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl TaskResult {
    /// The file the result is read from.
    pub fn effective_path(&self) -> String {
        match &self.path {
            Some(path) if !path.is_empty() => path.clone(),
            _ => format!("{RESULTS_ROOT}/{}", self.name),
        }
    }
}

/// A single container step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    /// Inline script; mutually exclusive with `command`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,
}

/// Environment variable set on a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Volume mounted into a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    #[serde(default)]
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

/// A named volume. The volume source is opaque to validation and kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub source: IndexMap<String, JsonValue>,
}
