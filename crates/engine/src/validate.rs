//! # Task Validation
//!
//! Entry points that run every check against a task in a fixed order and stop at the first
//! failure. The order matters to authors: reference problems are reported before structural
//! ones, and array usage last, once every reference is known to resolve.
//!
//! ```rust
//! use taskvet_engine::validate::validate_task_spec;
//! use taskvet_types::TaskSpec;
//!
//! let spec: TaskSpec = serde_yaml::from_str(r#"
//! params:
//!   - name: flags
//!     type: array
//! steps:
//!   - image: alpine
//!     args: ["echo", "$(params.flags)"]
//! "#)?;
//!
//! assert!(validate_task_spec(&spec).is_ok());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use taskvet_types::{TaskDocument, TaskSpec, merge_steps_with_template};
use tracing::debug;

use crate::dry_run::validate_expansion;
use crate::error::{FieldPath, ValidationError};
use crate::policy::validate_parameter_variables;
use crate::structure::{
    DNS_LABEL_MAX_LENGTH, validate_declared_workspaces, validate_parameter_types, validate_resources, validate_step_names, validate_steps,
    validate_volumes,
};

/// Validates a whole document: metadata first, then the spec with locators under `spec`.
pub fn validate_task(document: &TaskDocument) -> Result<(), ValidationError> {
    validate_object_metadata(&document.metadata.name)?;
    validate_task_spec(&document.spec).map_err(|error| error.via_field("spec"))
}

/// Validates a task spec, returning the first problem found.
pub fn validate_task_spec(spec: &TaskSpec) -> Result<(), ValidationError> {
    if spec.is_empty() {
        return Err(ValidationError::MissingField { locator: FieldPath::root() });
    }
    if spec.steps.is_empty() {
        return Err(ValidationError::MissingField {
            locator: FieldPath::root().field("steps"),
        });
    }

    validate_expansion(spec)?;

    validate_volumes(&spec.volumes)?;
    validate_declared_workspaces(&spec.workspaces, &spec.steps, spec.step_template.as_ref())?;

    let merged_steps = merge_steps_with_template(spec.step_template.as_ref(), &spec.steps);
    validate_steps(&merged_steps)?;

    validate_resources(spec.resources.as_ref())?;
    validate_parameter_types(&spec.params)?;
    validate_step_names(&spec.steps)?;

    validate_parameter_variables(&spec.steps, &spec.params)?;

    debug!(steps = spec.steps.len(), params = spec.params.len(), "task spec is valid");
    Ok(())
}

/// Validates the object name of a task document.
///
/// Bare specs carry no metadata, so an empty name is accepted.
pub fn validate_object_metadata(name: &str) -> Result<(), ValidationError> {
    let locator = FieldPath::root().field("metadata").field("name");
    if name.contains('.') {
        return Err(ValidationError::Invalid {
            message: "Invalid resource name: special character . must not be present".to_string(),
            locator,
            details: None,
        });
    }
    if name.len() > DNS_LABEL_MAX_LENGTH {
        return Err(ValidationError::Invalid {
            message: format!("Invalid resource name: length must be no more than {DNS_LABEL_MAX_LENGTH} characters"),
            locator,
            details: None,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn spec(yaml: &str) -> TaskSpec {
        serde_yaml::from_str(yaml).expect("valid task spec yaml")
    }

    #[test]
    fn empty_spec_and_missing_steps_are_missing_fields() {
        let error = validate_task_spec(&TaskSpec::default()).expect_err("empty spec");
        assert_eq!(error.kind(), ErrorKind::MissingField);

        let error = validate_task_spec(&spec("params:\n  - name: a\n")).expect_err("no steps");
        assert_eq!(error.locator().to_string(), "steps");
    }

    #[test]
    fn undefined_reference_reported_before_array_usage() {
        let task = spec(
            r#"
params:
  - name: flags
    type: array
steps:
  - image: $(params.flags)
    args: ["$(params.nope)"]
"#,
        );
        let error = validate_task_spec(&task).expect_err("two problems");
        assert_eq!(error.kind(), ErrorKind::UndefinedReference);
    }

    #[test]
    fn undeclared_param_in_any_step_field_is_rejected() {
        for field in ["workingDir: /src/$(params.dir)", "command: [\"$(inputs.params.dir)\"]", "env: [{name: D, value: \"$(params.dir)\"}]"] {
            let task = spec(&format!("params:\n  - name: other\nsteps:\n  - image: alpine\n    {field}\n"));
            let error = validate_task_spec(&task).expect_err("undeclared param");
            assert_eq!(error.kind(), ErrorKind::UndefinedReference, "{field}");
        }
    }

    #[test]
    fn array_in_image_is_illegal_usage() {
        let task = spec(
            r#"
params:
  - name: flags
    type: array
steps:
  - image: $(params.flags)
"#,
        );
        let error = validate_task_spec(&task).expect_err("array image");
        assert_eq!(error.kind(), ErrorKind::IllegalArrayUsage);
        assert_eq!(error.locator().to_string(), "steps[0].image");
    }

    #[test]
    fn step_template_supplies_missing_image() {
        let task = spec(
            r#"
stepTemplate:
  image: alpine
steps:
  - name: first
    script: echo hi
"#,
        );
        assert!(validate_task_spec(&task).is_ok());
    }

    #[test]
    fn indexed_reference_to_array_without_default_is_valid() {
        let without_default = spec(
            r#"
params:
  - name: flags
    type: array
steps:
  - image: alpine
    args: ["$(params.flags[0])"]
"#,
        );
        assert_eq!(validate_task_spec(&without_default), Ok(()));

        let with_default = spec(
            r#"
params:
  - name: flags
    type: array
    default: ["-v"]
steps:
  - image: alpine
    args: ["$(params.flags[0])"]
"#,
        );
        assert_eq!(validate_task_spec(&with_default), validate_task_spec(&without_default));
    }

    #[test]
    fn spec_without_placeholders_passes_every_check() {
        let task = spec(
            r#"
params:
  - name: flags
    type: array
workspaces:
  - name: source
    mountPath: /src
resources:
  inputs:
    - name: repo
      type: git
      targetPath: code
steps:
  - name: build
    image: golang
    command: ["go"]
    args: ["build", "./..."]
"#,
        );
        assert_eq!(validate_task_spec(&task), Ok(()));
    }

    #[test]
    fn validation_is_repeatable() {
        let task = spec(
            r#"
params:
  - name: flags
    type: array
steps:
  - image: alpine
    args: ["x$(params.flags)"]
"#,
        );
        assert_eq!(validate_task_spec(&task), validate_task_spec(&task));
    }

    #[test]
    fn document_errors_are_located_under_spec() {
        let document = TaskDocument {
            spec: spec("steps:\n  - image: alpine\n    args: [\"$(params.missing)\"]\n"),
            ..Default::default()
        };
        let error = validate_task(&document).expect_err("undefined");
        assert_eq!(error.locator().to_string(), "spec.steps[0].args[0]");
    }

    #[test]
    fn metadata_name_rules() {
        assert!(validate_object_metadata("").is_ok());
        assert!(validate_object_metadata("build-image").is_ok());
        assert!(validate_object_metadata("build.image").is_err());
        assert!(validate_object_metadata(&"a".repeat(64)).is_err());
    }
}
