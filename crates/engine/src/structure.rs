//! Structural checks on task declarations and steps.
//!
//! These are plain set and uniqueness checks. Each function returns the first problem found.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use taskvet_types::{ParamSpec, ResourceType, Step, TaskResource, TaskResources, Volume, WorkspaceDeclaration, paths};
use tracing::debug;

use crate::error::{FieldPath, ValidationError};

/// Longest permitted DNS-1123 label.
pub const DNS_LABEL_MAX_LENGTH: usize = 63;

static DNS_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("dns label regex should compile"));

const RESERVED_MOUNT_ROOT: &str = "/tekton/";
const ALLOWED_RESERVED_MOUNT: &str = "/tekton/home";
const RESERVED_VOLUME_PREFIX: &str = "tekton-internal-";

/// Rejects duplicate volume names.
pub fn validate_volumes(volumes: &[Volume]) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for volume in volumes {
        if !names.insert(volume.name.as_str()) {
            return Err(ValidationError::invalid(
                format!("multiple volumes with same name \"{}\"", volume.name),
                FieldPath::root().field("volumes").field("name"),
            ));
        }
    }
    Ok(())
}

/// Checks workspace names are unique and that no workspace mounts over a path already used by a
/// step, the step template, or another workspace.
pub fn validate_declared_workspaces(
    workspaces: &[WorkspaceDeclaration],
    steps: &[Step],
    step_template: Option<&Step>,
) -> Result<(), ValidationError> {
    let mut mount_paths: HashSet<String> = steps
        .iter()
        .chain(step_template)
        .flat_map(|step| step.volume_mounts.iter())
        .map(|mount| paths::clean(&mount.mount_path))
        .collect();

    let mut names = HashSet::new();
    for workspace in workspaces {
        if !names.insert(workspace.name.as_str()) {
            return Err(ValidationError::invalid(
                format!("workspace name \"{}\" must be unique", workspace.name),
                FieldPath::root().field("workspaces").field("name"),
            ));
        }

        let mount_path = paths::clean(&workspace.effective_mount_path());
        if mount_paths.contains(&mount_path) {
            return Err(ValidationError::invalid(
                format!("workspace mount path \"{mount_path}\" must be unique"),
                FieldPath::root().field("workspaces").field("mountPath"),
            ));
        }
        debug!("Validated workspace declaration: {}", workspace.name);
        mount_paths.insert(mount_path);
    }
    Ok(())
}

/// Checks merged steps: image required, script excludes command, unique names, and reserved mounts.
pub fn validate_steps(steps: &[Step]) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for (index, step) in steps.iter().enumerate() {
        let step_path = FieldPath::root().field("steps").index(index);

        if step.image.is_empty() {
            return Err(ValidationError::MissingField {
                locator: step_path.field("image"),
            });
        }

        if !step.script.is_empty() && !step.command.is_empty() {
            return Err(ValidationError::invalid(
                format!("step {index} script cannot be used with command"),
                step_path.field("script"),
            ));
        }

        if !step.name.is_empty() && !names.insert(step.name.as_str()) {
            return Err(ValidationError::InvalidValue {
                value: step.name.clone(),
                locator: step_path.field("name"),
                details: Some("step names must be unique within a task".to_string()),
            });
        }

        for (position, mount) in step.volume_mounts.iter().enumerate() {
            let mount_locator = step_path.clone().field("volumeMounts").index(position);
            if mount.mount_path.starts_with(RESERVED_MOUNT_ROOT) && !mount.mount_path.starts_with(ALLOWED_RESERVED_MOUNT) {
                return Err(ValidationError::invalid(
                    format!(
                        "step {index} volumeMount cannot be mounted under {RESERVED_MOUNT_ROOT} (volumeMount \"{}\" mounted at \"{}\")",
                        mount.name, mount.mount_path
                    ),
                    mount_locator.field("mountPath"),
                ));
            }
            if mount.name.starts_with(RESERVED_VOLUME_PREFIX) {
                return Err(ValidationError::invalid(
                    format!("step {index} volumeMount name \"{}\" cannot start with \"{RESERVED_VOLUME_PREFIX}\"", mount.name),
                    mount_locator.field("name"),
                ));
            }
        }
    }
    Ok(())
}

/// Checks resource names are unique per direction and declared types are known.
pub fn validate_resources(resources: Option<&TaskResources>) -> Result<(), ValidationError> {
    let Some(resources) = resources else {
        return Ok(());
    };
    validate_resource_list(&resources.inputs, "inputs")?;
    validate_resource_list(&resources.outputs, "outputs")
}

fn validate_resource_list(resources: &[TaskResource], direction: &str) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for (index, resource) in resources.iter().enumerate() {
        let resource_path = FieldPath::root().field("resources").field(direction).index(index);
        if !names.insert(resource.name.as_str()) {
            return Err(ValidationError::invalid(
                format!("resource name \"{}\" must be unique", resource.name),
                resource_path.field("name"),
            ));
        }
        if let Some(tag) = resource.r#type.as_deref()
            && ResourceType::parse(tag).is_none()
        {
            let known: Vec<&str> = ResourceType::ALL.iter().map(ResourceType::as_str).collect();
            return Err(ValidationError::InvalidValue {
                value: tag.to_string(),
                locator: resource_path.field("type"),
                details: Some(format!("resource type must be one of: {}", known.join(", "))),
            });
        }
    }
    Ok(())
}

/// Checks parameter names are unique and defaults match their declared type.
///
/// Unknown type names never get this far; they are rejected when the document is decoded.
pub fn validate_parameter_types(params: &[ParamSpec]) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for param in params {
        let param_path = FieldPath::root().field("params").field(param.name.as_str());
        if !names.insert(param.name.as_str()) {
            return Err(ValidationError::invalid(
                format!("parameter name \"{}\" must be unique", param.name),
                param_path.field("name"),
            ));
        }

        if let Some(default) = &param.default
            && default.param_type() != param.r#type
        {
            return Err(ValidationError::Invalid {
                message: format!("\"{}\" type does not match default value's type: \"{}\"", param.r#type, default.param_type()),
                locator: param_path.clone().field("type"),
                details: Some(format!("change {} to a {} value", param_path.field("default"), param.r#type)),
            });
        }
    }
    Ok(())
}

/// Checks every non-empty step name is a DNS-1123 label.
pub fn validate_step_names(steps: &[Step]) -> Result<(), ValidationError> {
    for (index, step) in steps.iter().enumerate() {
        if !step.name.is_empty() && !is_dns1123_label(&step.name) {
            return Err(ValidationError::InvalidValue {
                value: step.name.clone(),
                locator: FieldPath::root().field("steps").index(index).field("name"),
                details: Some(
                    "Task step name must be a valid DNS Label, For more info refer to https://kubernetes.io/docs/concepts/overview/working-with-objects/names/#names"
                        .to_string(),
                ),
            });
        }
    }
    Ok(())
}

/// True when `value` is a lowercase RFC 1123 label of at most 63 characters.
pub fn is_dns1123_label(value: &str) -> bool {
    value.len() <= DNS_LABEL_MAX_LENGTH && DNS_LABEL_REGEX.is_match(value)
}
