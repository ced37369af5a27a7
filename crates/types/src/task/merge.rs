//! Step template merging.
//!
//! A task may declare a `stepTemplate` whose fields act as defaults for every step. The merge
//! mirrors container defaulting: scalar fields and argv lists fall back to the template when the
//! step leaves them empty, while env vars and volume mounts are combined by name with the step
//! winning on conflicts.

use super::Step;

impl Step {
    /// Returns a copy of this step with `template` applied as defaults.
    pub fn merged_with(&self, template: &Step) -> Step {
        Step {
            name: prefer_step(&self.name, &template.name),
            image: prefer_step(&self.image, &template.image),
            command: prefer_step_list(&self.command, &template.command),
            args: prefer_step_list(&self.args, &template.args),
            working_dir: prefer_step(&self.working_dir, &template.working_dir),
            env: merge_by_name(&template.env, &self.env, |env| env.name.as_str()),
            volume_mounts: merge_by_name(&template.volume_mounts, &self.volume_mounts, |mount| mount.name.as_str()),
            script: prefer_step(&self.script, &template.script),
        }
    }
}

/// Applies an optional template to every step.
pub fn merge_steps_with_template(template: Option<&Step>, steps: &[Step]) -> Vec<Step> {
    match template {
        Some(template) => steps.iter().map(|step| step.merged_with(template)).collect(),
        None => steps.to_vec(),
    }
}

fn prefer_step(step_value: &str, template_value: &str) -> String {
    let chosen = if step_value.is_empty() { template_value } else { step_value };
    chosen.to_string()
}

fn prefer_step_list(step_values: &[String], template_values: &[String]) -> Vec<String> {
    let chosen = if step_values.is_empty() { template_values } else { step_values };
    chosen.to_vec()
}

fn merge_by_name<T: Clone>(template_items: &[T], step_items: &[T], name_of: impl Fn(&T) -> &str) -> Vec<T> {
    let mut merged: Vec<T> = template_items
        .iter()
        .filter(|template_item| !step_items.iter().any(|step_item| name_of(step_item) == name_of(template_item)))
        .cloned()
        .collect();
    merged.extend(step_items.iter().cloned());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::EnvVar;

    fn env(name: &str, value: &str) -> EnvVar {
        EnvVar {
            name: name.into(),
            value: value.into(),
        }
    }

    #[test]
    fn template_fills_empty_fields_only() {
        let template = Step {
            image: "alpine".into(),
            working_dir: "/workspace".into(),
            args: vec!["--default".into()],
            ..Default::default()
        };
        let step = Step {
            name: "build".into(),
            working_dir: "/src".into(),
            ..Default::default()
        };

        let merged = step.merged_with(&template);
        assert_eq!(merged.name, "build");
        assert_eq!(merged.image, "alpine");
        assert_eq!(merged.working_dir, "/src");
        assert_eq!(merged.args, vec!["--default".to_string()]);
    }

    #[test]
    fn env_entries_from_step_override_template_by_name() {
        let template = Step {
            env: vec![env("HOME", "/tekton/home"), env("MODE", "template")],
            ..Default::default()
        };
        let step = Step {
            env: vec![env("MODE", "step")],
            ..Default::default()
        };

        let merged = step.merged_with(&template);
        assert_eq!(merged.env, vec![env("HOME", "/tekton/home"), env("MODE", "step")]);
    }

    #[test]
    fn no_template_returns_steps_unchanged() {
        let steps = vec![Step {
            name: "only".into(),
            ..Default::default()
        }];
        assert_eq!(merge_steps_with_template(None, &steps), steps);
    }
}
