//! Array parameter usage rules for step fields.
//!
//! Every substitution-eligible string on a step is classified by a [`FieldPolicy`]:
//!
//! | field                                               | policy                |
//! |-----------------------------------------------------|-----------------------|
//! | name, image, workingDir, env value, volume mounts    | [`FieldPolicy::NoArray`] |
//! | each command entry, each args entry                  | [`FieldPolicy::IsolatedArray`] |
//!
//! The checks are purely textual and run on the raw step values, independent of the lookup
//! context. They complement the expansion dry run, which only proves references resolve.

use indexmap::IndexSet;
use taskvet_types::{ParamSpec, Step};
use tracing::debug;

use crate::catalog::DeclaredNames;
use crate::error::{FieldPath, FieldPolicy, ValidationError};
use crate::syntax::{is_isolated_reference, param_references, references_any};

/// One substitution-eligible string on a step, with its policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepField<'a> {
    pub locator: FieldPath,
    pub value: &'a str,
    pub policy: FieldPolicy,
}

/// Lists every substitution-eligible field of the step at `index`, in a fixed order.
pub fn step_fields(index: usize, step: &Step) -> Vec<StepField<'_>> {
    let step_path = FieldPath::root().field("steps").index(index);

    let mut fields = vec![
        no_array(step_path.clone().field("name"), &step.name),
        no_array(step_path.clone().field("image"), &step.image),
        no_array(step_path.clone().field("workingDir"), &step.working_dir),
    ];
    for (position, entry) in step.command.iter().enumerate() {
        fields.push(StepField {
            locator: step_path.clone().field("command").index(position),
            value: entry,
            policy: FieldPolicy::IsolatedArray,
        });
    }
    for (position, entry) in step.args.iter().enumerate() {
        fields.push(StepField {
            locator: step_path.clone().field("args").index(position),
            value: entry,
            policy: FieldPolicy::IsolatedArray,
        });
    }
    for (position, env) in step.env.iter().enumerate() {
        fields.push(no_array(step_path.clone().field("env").index(position).field("value"), &env.value));
    }
    for (position, mount) in step.volume_mounts.iter().enumerate() {
        let mount_path = step_path.clone().field("volumeMounts").index(position);
        fields.push(no_array(mount_path.clone().field("name"), &mount.name));
        fields.push(no_array(mount_path.clone().field("mountPath"), &mount.mount_path));
        fields.push(no_array(mount_path.field("subPath"), &mount.sub_path));
    }
    fields
}

fn no_array(locator: FieldPath, value: &str) -> StepField<'_> {
    StepField {
        locator,
        value,
        policy: FieldPolicy::NoArray,
    }
}

/// Checks one field's raw text against its policy.
pub fn check_field(field: &StepField<'_>, arrays: &IndexSet<String>) -> Result<(), ValidationError> {
    let illegal = |variable: String| ValidationError::IllegalArrayUsage {
        variable,
        locator: field.locator.clone(),
        policy: field.policy,
    };

    match field.policy {
        FieldPolicy::NoArray => match references_any(field.value, arrays) {
            Some(variable) => Err(illegal(variable)),
            None => Ok(()),
        },
        FieldPolicy::IsolatedArray => {
            let references = param_references(field.value, arrays);
            match references.as_slice() {
                [] => Ok(()),
                [only] if is_isolated_reference(field.value, &only.name) => Ok(()),
                [first, ..] => Err(illegal(first.path.clone())),
            }
        }
    }
}

/// Walks every step field and rejects illegal references to the array parameters in `arrays`.
pub fn validate_array_usage(steps: &[Step], arrays: &IndexSet<String>) -> Result<(), ValidationError> {
    if arrays.is_empty() {
        return Ok(());
    }
    for (index, step) in steps.iter().enumerate() {
        for field in step_fields(index, step) {
            check_field(&field, arrays)?;
        }
    }
    Ok(())
}

/// Runs the array usage rules for the parameters a task declares.
pub fn validate_parameter_variables(steps: &[Step], params: &[ParamSpec]) -> Result<(), ValidationError> {
    let names = DeclaredNames::from_params(params);
    debug!(params = names.all.len(), arrays = names.arrays.len(), "checking array parameter usage");
    validate_array_usage(steps, &names.arrays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskvet_types::{EnvVar, ParamType, VolumeMount};

    fn arrays() -> IndexSet<String> {
        IndexSet::from(["flags".to_string()])
    }

    fn step_with_args(args: &[&str]) -> Step {
        Step {
            name: "build".into(),
            image: "golang".into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn isolated_array_reference_in_args_passes() {
        assert!(validate_array_usage(&[step_with_args(&["$(params.flags)"])], &arrays()).is_ok());
        assert!(validate_array_usage(&[step_with_args(&["$(inputs.params.flags)"])], &arrays()).is_ok());
    }

    #[test]
    fn array_reference_with_extra_character_fails() {
        for arg in ["x$(params.flags)", "$(params.flags)x", " $(params.flags)"] {
            let error = validate_array_usage(&[step_with_args(&["ok", arg])], &arrays()).expect_err("concatenated array");
            assert_eq!(
                error,
                ValidationError::IllegalArrayUsage {
                    variable: "params.flags".into(),
                    locator: FieldPath::root().field("steps").index(0).field("args").index(1),
                    policy: FieldPolicy::IsolatedArray,
                }
            );
        }
    }

    #[test]
    fn command_entries_follow_isolation_rule() {
        let step = Step {
            image: "alpine".into(),
            command: vec!["$(params.flags)".into(), "sh -c $(params.flags)".into()],
            ..Default::default()
        };
        let error = validate_array_usage(&[step], &arrays()).expect_err("concatenated in command");
        assert_eq!(error.locator().to_string(), "steps[0].command[1]");
    }

    #[test]
    fn array_in_image_fails_even_when_isolated() {
        let step = Step {
            image: "$(params.flags)".into(),
            ..Default::default()
        };
        let error = validate_array_usage(&[step], &arrays()).expect_err("array in image");
        assert_eq!(error.locator().to_string(), "steps[0].image");
        assert!(matches!(error, ValidationError::IllegalArrayUsage { policy: FieldPolicy::NoArray, .. }));
    }

    #[test]
    fn array_in_env_and_volume_mounts_fails() {
        let env_step = Step {
            image: "alpine".into(),
            env: vec![EnvVar {
                name: "FLAGS".into(),
                value: "$(params.flags)".into(),
            }],
            ..Default::default()
        };
        let error = validate_array_usage(&[env_step], &arrays()).expect_err("array in env");
        assert_eq!(error.locator().to_string(), "steps[0].env[0].value");

        let mount_step = Step {
            image: "alpine".into(),
            volume_mounts: vec![VolumeMount {
                name: "cache".into(),
                mount_path: "/cache".into(),
                sub_path: "dir/$(params.flags)".into(),
                read_only: false,
            }],
            ..Default::default()
        };
        let error = validate_array_usage(&[Step::default(), mount_step], &arrays()).expect_err("array in subPath");
        assert_eq!(error.locator().to_string(), "steps[1].volumeMounts[0].subPath");
    }

    #[test]
    fn scalar_references_are_unrestricted() {
        let step = Step {
            name: "$(params.name)".into(),
            image: "repo/$(params.name):latest".into(),
            args: vec!["--name=$(params.name)".into(), "$(params.flags[0])-suffix".into()],
            ..Default::default()
        };
        assert!(validate_array_usage(&[step], &arrays()).is_ok());
    }

    #[test]
    fn walker_visits_every_eligible_field() {
        let step = Step {
            name: "n".into(),
            image: "i".into(),
            command: vec!["c".into()],
            args: vec!["a1".into(), "a2".into()],
            working_dir: "w".into(),
            env: vec![EnvVar {
                name: "E".into(),
                value: "v".into(),
            }],
            volume_mounts: vec![VolumeMount {
                name: "m".into(),
                mount_path: "/m".into(),
                sub_path: "s".into(),
                read_only: false,
            }],
            script: String::new(),
        };
        let fields = step_fields(0, &step);
        let isolated = fields.iter().filter(|field| field.policy == FieldPolicy::IsolatedArray).count();
        assert_eq!(fields.len(), 10);
        assert_eq!(isolated, 3);
    }

    #[test]
    fn parameter_variables_use_declared_array_names() {
        let params = vec![ParamSpec {
            name: "flags".into(),
            r#type: ParamType::Array,
            description: None,
            default: None,
        }];
        let steps = vec![Step {
            image: "$(params.flags)".into(),
            ..Default::default()
        }];
        assert!(validate_parameter_variables(&steps, &params).is_err());
        assert!(validate_parameter_variables(&steps, &[]).is_ok());
    }
}
