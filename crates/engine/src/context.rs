//! # Lookup Context
//!
//! Builds the context that placeholder expansion resolves against during validation. Its shape
//! matches the context used at execution time, but it is filled with declared defaults and empty
//! placeholders because no real values exist yet. Only the shape matters: a correct reference must
//! resolve, an incorrect one must not.
//!
//! ```text
//! params.<name>                      default, "" or []
//! workspaces.<name>.path
//! resources.inputs.<name>.*          path, name, type, type-specific keys
//! resources.outputs.<name>.*
//! results.<name>.path
//! inputs.params.<name>               legacy alias of params
//! inputs.resources.<name>.*          legacy alias of resources.inputs
//! outputs.resources.<name>.*         legacy alias of resources.outputs
//! ```
//!
//! Entries are built straight from the typed declarations as [`ContextEntry`] variants and only
//! rendered to JSON at the end, so no stage has to re-inspect loosely typed maps.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use taskvet_types::{ParamSpec, ParamType, ParamValue, ResourceDirection, ResourceType, TaskResource, TaskResult, TaskSpec, WorkspaceDeclaration};
use tracing::debug;

/// Extra keys every resource of a given type exposes, on top of `path`, `name`, and `type`.
///
/// Adding a resource type means adding one row here.
pub static RESOURCE_PLACEHOLDER_KEYS: &[(ResourceType, &[&str])] = &[
    (ResourceType::Git, &["url", "revision", "depth", "sslVerify"]),
    (ResourceType::Image, &["url", "digest"]),
    (
        ResourceType::Cluster,
        &["url", "revision", "username", "password", "namespace", "token", "insecure", "cadata"],
    ),
    (ResourceType::Storage, &["location"]),
    (ResourceType::PullRequest, &["url", "provider", "insecure-skip-tls-verify"]),
    (ResourceType::CloudEvent, &["target-uri"]),
];

/// Type-specific placeholder keys for `resource_type`.
pub fn placeholder_keys(resource_type: ResourceType) -> &'static [&'static str] {
    RESOURCE_PLACEHOLDER_KEYS
        .iter()
        .find(|(candidate, _)| *candidate == resource_type)
        .map(|(_, keys)| *keys)
        .unwrap_or_default()
}

/// A single named entry of the lookup context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEntry {
    /// String parameter value.
    Scalar(String),
    /// Array parameter value.
    Array(Vec<String>),
    /// Declared workspace.
    Workspace { path: String },
    /// Declared input or output resource.
    Resource(ResourceEntry),
    /// Declared result.
    Result { path: String },
}

impl ContextEntry {
    /// Entry for a parameter: its default when present, otherwise an empty value of its type.
    pub fn for_param(param: &ParamSpec) -> Self {
        match (&param.default, param.r#type) {
            (Some(ParamValue::String(value)), _) => ContextEntry::Scalar(value.clone()),
            (Some(ParamValue::Array(values)), _) => ContextEntry::Array(values.clone()),
            (None, ParamType::String) => ContextEntry::Scalar(String::new()),
            (None, ParamType::Array) => ContextEntry::Array(Vec::new()),
        }
    }

    pub fn for_workspace(workspace: &WorkspaceDeclaration) -> Self {
        ContextEntry::Workspace {
            path: workspace.effective_mount_path(),
        }
    }

    pub fn for_resource(resource: &TaskResource, direction: ResourceDirection) -> Self {
        ContextEntry::Resource(ResourceEntry {
            name: resource.name.clone(),
            path: resource.effective_path(direction),
            resource_type: resource.resource_type(),
        })
    }

    pub fn for_result(result: &TaskResult) -> Self {
        ContextEntry::Result {
            path: result.effective_path(),
        }
    }

    /// Renders the entry in the JSON shape placeholders resolve against.
    pub fn to_value(&self) -> Value {
        match self {
            ContextEntry::Scalar(value) => Value::String(value.clone()),
            ContextEntry::Array(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
            ContextEntry::Workspace { path } | ContextEntry::Result { path } => json!({ "path": path }),
            ContextEntry::Resource(resource) => resource.to_value(),
        }
    }
}

/// Placeholder values exposed for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub path: String,
    /// `None` when the declared type is absent or unknown.
    pub resource_type: Option<ResourceType>,
}

impl ResourceEntry {
    /// All keys this resource exposes.
    ///
    /// Unknown or missing types only expose `path` and `name`; rejecting the type itself is left
    /// to the declaration checks.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["path", "name"];
        if let Some(resource_type) = self.resource_type {
            keys.push("type");
            keys.extend_from_slice(placeholder_keys(resource_type));
        }
        keys
    }

    fn to_value(&self) -> Value {
        let mut fields = Map::new();
        for key in self.keys() {
            let value = match key {
                "path" => self.path.clone(),
                "name" => self.name.clone(),
                "type" => self.resource_type.map(|resource_type| resource_type.to_string()).unwrap_or_default(),
                _ => String::new(),
            };
            fields.insert(key.to_string(), Value::String(value));
        }
        Value::Object(fields)
    }
}

/// The complete validation-time lookup context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupContext {
    pub params: IndexMap<String, ContextEntry>,
    pub workspaces: IndexMap<String, ContextEntry>,
    pub input_resources: IndexMap<String, ContextEntry>,
    pub output_resources: IndexMap<String, ContextEntry>,
    pub results: IndexMap<String, ContextEntry>,
}

impl LookupContext {
    /// Builds the context from a task's declarations.
    pub fn from_spec(spec: &TaskSpec) -> Self {
        let mut context = LookupContext::default();

        for param in &spec.params {
            debug!(param = %param.name, param_type = %param.r#type, "adding param to lookup context");
            context.params.insert(param.name.clone(), ContextEntry::for_param(param));
        }
        for workspace in &spec.workspaces {
            debug!(workspace = %workspace.name, "adding workspace to lookup context");
            context.workspaces.insert(workspace.name.clone(), ContextEntry::for_workspace(workspace));
        }
        for resource in spec.input_resources() {
            debug!(resource = %resource.name, "adding input resource to lookup context");
            context
                .input_resources
                .insert(resource.name.clone(), ContextEntry::for_resource(resource, ResourceDirection::Input));
        }
        for resource in spec.output_resources() {
            debug!(resource = %resource.name, "adding output resource to lookup context");
            context
                .output_resources
                .insert(resource.name.clone(), ContextEntry::for_resource(resource, ResourceDirection::Output));
        }
        for result in &spec.results {
            debug!(result = %result.name, "adding result to lookup context");
            context.results.insert(result.name.clone(), ContextEntry::for_result(result));
        }

        context
    }

    /// Renders the nested JSON context, including the legacy `inputs` and `outputs` aliases.
    pub fn to_value(&self) -> Value {
        let params = render_entries(&self.params);
        let input_resources = render_entries(&self.input_resources);
        let output_resources = render_entries(&self.output_resources);

        json!({
            "params": params.clone(),
            "workspaces": render_entries(&self.workspaces),
            "resources": {
                "inputs": input_resources.clone(),
                "outputs": output_resources.clone(),
            },
            "results": render_entries(&self.results),
            "inputs": {
                "params": params,
                "resources": input_resources,
            },
            "outputs": {
                "resources": output_resources,
            },
        })
    }
}

fn render_entries(entries: &IndexMap<String, ContextEntry>) -> Value {
    Value::Object(entries.iter().map(|(name, entry)| (name.clone(), entry.to_value())).collect())
}
