//! # Taskvet Engine
//!
//! The Taskvet Engine statically validates declarative task specifications before they are ever
//! scheduled. It catches the two classes of mistake that otherwise only surface at run time:
//! placeholders that name something the task never declares, and array parameters used where
//! only a single string can go.
//!
//! ## Key Features
//!
//! - **Lookup Context**: Builds the namespace of every value a placeholder may reference
//! - **Expansion Dry Run**: Expands `$(...)` placeholders across the whole spec and reports the first undefined one
//! - **Field Policies**: Enforces where array parameters may appear in step fields
//! - **Structural Checks**: Volumes, workspaces, resources, parameter types, and step names
//!
//! ## Usage
//!
//! ```rust
//! use taskvet_engine::{parse_task_file, validate_task};
//!
//! let temp_dir = tempfile::tempdir()?;
//! let task_path = temp_dir.path().join("task.yaml");
//! std::fs::write(&task_path, r#"
//! params:
//!   - name: message
//! steps:
//!   - image: alpine
//!     args: ["echo", "$(params.message)"]
//! "#)?;
//!
//! let document = parse_task_file(&task_path)?;
//! assert!(validate_task(&document).is_ok());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`context`**: Lookup Context construction and the resource placeholder key table
//! - **`expand`**: Placeholder expansion over JSON trees
//! - **`dry_run`**: Expansion of the whole spec against the Lookup Context
//! - **`syntax`** and **`catalog`**: Parameter reference classification
//! - **`policy`**: Array usage rules per step field
//! - **`structure`**: Structural checks that do not involve placeholders
//! - **`validate`**: Ordered composition of every check

use std::{fs, path::Path};

use anyhow::{Context, Result};
use taskvet_types::{TaskDocument, TaskSpec};
use tracing::debug;

pub mod catalog;
pub mod context;
pub mod dry_run;
pub mod error;
pub mod expand;
pub mod policy;
pub mod structure;
pub mod syntax;
pub mod validate;

pub use context::{ContextEntry, LookupContext, ResourceEntry, placeholder_keys};
pub use dry_run::validate_expansion;
pub use error::{ErrorKind, FieldPath, FieldPolicy, ValidationError};
pub use expand::{ExpansionError, IndexResolution, expand, expand_with};
pub use policy::{validate_array_usage, validate_parameter_variables};
pub use validate::{validate_task, validate_task_spec};

/// Loads a task file from the filesystem.
///
/// YAML and JSON are both accepted. A document with a top-level `spec` key is read as a full
/// task resource; anything else is read as a bare task spec with empty metadata.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content does not match either shape.
pub fn parse_task_file(file_path: impl AsRef<Path>) -> Result<TaskDocument> {
    let file_path = file_path.as_ref();
    let file_content = fs::read(file_path).with_context(|| format!("Failed to read task file: {}", file_path.display()))?;
    let content_string = String::from_utf8_lossy(&file_content);

    parse_task_document(&content_string).with_context(|| format!("Failed to parse task file: {}", file_path.display()))
}

/// Parses task content already held in memory. See [`parse_task_file`].
pub fn parse_task_document(content: &str) -> Result<TaskDocument> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content).context("content is not valid YAML or JSON")?;

    // Checking for `spec` first avoids reading a full resource as a bare spec with every field ignored.
    if raw.get("spec").is_some() {
        let document: TaskDocument = serde_yaml::from_value(raw).context("content does not match the task resource shape")?;
        debug!(name = %document.metadata.name, "parsed task resource");
        return Ok(document);
    }

    let spec: TaskSpec = serde_yaml::from_value(raw).context("content does not match the task spec shape")?;
    debug!(steps = spec.steps.len(), "parsed bare task spec");
    Ok(TaskDocument {
        spec,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_file_full_resource() {
        let temp_dir = tempfile::tempdir().unwrap();
        let task_path = temp_dir.path().join("task.yaml");

        let task_content = r#"
apiVersion: tekton.dev/v1beta1
kind: Task
metadata:
  name: build
spec:
  params:
    - name: revision
  steps:
    - image: alpine
"#;

        fs::write(&task_path, task_content).unwrap();

        let document = parse_task_file(&task_path).expect("parse task resource");
        assert_eq!(document.metadata.name, "build");
        assert_eq!(document.kind.as_deref(), Some("Task"));
        assert_eq!(document.spec.params.len(), 1);
        assert_eq!(document.spec.steps.len(), 1);
    }

    #[test]
    fn test_parse_task_file_bare_spec_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let task_path = temp_dir.path().join("task.json");

        fs::write(&task_path, r#"{"steps": [{"image": "alpine", "args": ["$(params.x)"]}]}"#).unwrap();

        let document = parse_task_file(&task_path).expect("parse bare spec");
        assert!(document.metadata.name.is_empty());
        assert_eq!(document.spec.steps[0].args, vec!["$(params.x)".to_string()]);
    }

    #[test]
    fn test_parse_task_file_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let error = parse_task_file(temp_dir.path().join("absent.yaml")).expect_err("missing file");
        assert!(error.to_string().contains("Failed to read task file"));
    }

    #[test]
    fn test_parse_task_document_rejects_wrong_shape() {
        assert!(parse_task_document("steps: 12").is_err());
        assert!(parse_task_document("steps: [").is_err());
    }
}
