//! Validation error types.
//!
//! Every check in the engine stops at the first problem it finds and reports it as a single
//! [`ValidationError`]. Each error carries a [`FieldPath`] locator pointing from the spec root to
//! the offending declaration or step field, because callers render it straight to the author.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Ordered path segments from the specification root to a field.
///
/// Segments are rendered joined by `.`, with list positions attached to their field as
/// `steps[0]`, so a locator reads `steps[0].args[1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The specification root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Appends a named field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.0.push(name.into());
        self
    }

    /// Attaches a list position to the last segment.
    pub fn index(mut self, position: usize) -> Self {
        match self.0.last_mut() {
            Some(last) => last.push_str(&format!("[{position}]")),
            None => self.0.push(format!("[{position}]")),
        }
        self
    }

    /// The raw segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("."))
    }
}

/// How a step field may reference array parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldPolicy {
    /// Array parameters may not be referenced at all.
    NoArray,
    /// Array parameters may only appear as the whole field value.
    IsolatedArray,
}

/// Coarse classification of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UndefinedReference,
    IllegalArrayUsage,
    MalformedDeclaration,
    MissingField,
    InvalidValue,
    Invalid,
}

/// A single specification error reported to the author.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A placeholder names a context path that does not exist.
    #[error("non-existent variable `{reference}` in {locator}")]
    UndefinedReference { reference: String, locator: FieldPath },

    /// An array parameter is referenced where only scalars or an isolated reference may appear.
    #[error("{}", illegal_array_message(.variable, .locator, .policy))]
    IllegalArrayUsage {
        variable: String,
        locator: FieldPath,
        policy: FieldPolicy,
    },

    /// A declaration could not be turned into its generic tree form.
    #[error("malformed declaration at {locator}: {reason}")]
    MalformedDeclaration { locator: FieldPath, reason: String },

    #[error("missing field(s): {locator}")]
    MissingField { locator: FieldPath },

    #[error("invalid value: {value}: {locator}")]
    InvalidValue {
        value: String,
        locator: FieldPath,
        details: Option<String>,
    },

    /// Structural problem reported by a set or uniqueness check.
    #[error("{message}: {locator}")]
    Invalid {
        message: String,
        locator: FieldPath,
        details: Option<String>,
    },
}

fn illegal_array_message(variable: &str, locator: &FieldPath, policy: &FieldPolicy) -> String {
    match policy {
        FieldPolicy::NoArray => format!("array variable `{variable}` is not allowed in {locator}"),
        FieldPolicy::IsolatedArray => format!("array variable `{variable}` must be the only content of {locator}"),
    }
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::UndefinedReference { .. } => ErrorKind::UndefinedReference,
            ValidationError::IllegalArrayUsage { .. } => ErrorKind::IllegalArrayUsage,
            ValidationError::MalformedDeclaration { .. } => ErrorKind::MalformedDeclaration,
            ValidationError::MissingField { .. } => ErrorKind::MissingField,
            ValidationError::InvalidValue { .. } => ErrorKind::InvalidValue,
            ValidationError::Invalid { .. } => ErrorKind::Invalid,
        }
    }

    /// Human-readable message without the locator suffix.
    pub fn message(&self) -> String {
        match self {
            ValidationError::UndefinedReference { reference, .. } => format!("non-existent variable `{reference}`"),
            ValidationError::IllegalArrayUsage { variable, policy, .. } => match policy {
                FieldPolicy::NoArray => format!("array variable `{variable}` is not allowed here"),
                FieldPolicy::IsolatedArray => format!("array variable `{variable}` cannot be combined with other text"),
            },
            ValidationError::MalformedDeclaration { reason, .. } => format!("malformed declaration: {reason}"),
            ValidationError::MissingField { .. } => "missing field(s)".to_string(),
            ValidationError::InvalidValue { value, .. } => format!("invalid value: {value}"),
            ValidationError::Invalid { message, .. } => message.clone(),
        }
    }

    /// Locator of the offending field.
    pub fn locator(&self) -> &FieldPath {
        match self {
            ValidationError::UndefinedReference { locator, .. }
            | ValidationError::IllegalArrayUsage { locator, .. }
            | ValidationError::MalformedDeclaration { locator, .. }
            | ValidationError::MissingField { locator }
            | ValidationError::InvalidValue { locator, .. }
            | ValidationError::Invalid { locator, .. } => locator,
        }
    }

    /// Rendered locators, one per offending field.
    pub fn paths(&self) -> Vec<String> {
        vec![self.locator().to_string()]
    }

    /// Optional remediation hint.
    pub fn details(&self) -> Option<String> {
        match self {
            ValidationError::IllegalArrayUsage { variable, policy, .. } => Some(match policy {
                FieldPolicy::NoArray => format!("`{variable}` is an array parameter; reference it only from command or args entries"),
                FieldPolicy::IsolatedArray => {
                    format!("move `$({variable})` into its own command or args entry so it can expand into separate arguments")
                }
            }),
            ValidationError::InvalidValue { details, .. } | ValidationError::Invalid { details, .. } => details.clone(),
            _ => None,
        }
    }

    /// Builds an [`ValidationError::Invalid`] without details.
    pub fn invalid(message: impl Into<String>, locator: FieldPath) -> Self {
        ValidationError::Invalid {
            message: message.into(),
            locator,
            details: None,
        }
    }

    /// Prefixes the locator with `segment`, for errors raised relative to a nested value.
    pub fn via_field(self, segment: &str) -> Self {
        let rebase = |locator: FieldPath| {
            let mut segments = vec![segment.to_string()];
            segments.extend(locator.0);
            FieldPath(segments)
        };
        match self {
            ValidationError::UndefinedReference { reference, locator } => ValidationError::UndefinedReference {
                reference,
                locator: rebase(locator),
            },
            ValidationError::IllegalArrayUsage { variable, locator, policy } => ValidationError::IllegalArrayUsage {
                variable,
                locator: rebase(locator),
                policy,
            },
            ValidationError::MalformedDeclaration { locator, reason } => ValidationError::MalformedDeclaration {
                locator: rebase(locator),
                reason,
            },
            ValidationError::MissingField { locator } => ValidationError::MissingField { locator: rebase(locator) },
            ValidationError::InvalidValue { value, locator, details } => ValidationError::InvalidValue {
                value,
                locator: rebase(locator),
                details,
            },
            ValidationError::Invalid { message, locator, details } => ValidationError::Invalid {
                message,
                locator: rebase(locator),
                details,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_path_renders_indices() {
        let path = FieldPath::root().field("steps").index(2).field("env").index(0).field("value");
        assert_eq!(path.to_string(), "steps[2].env[0].value");
        assert_eq!(FieldPath::root().to_string(), "<root>");
    }

    #[test]
    fn illegal_array_usage_carries_variable_and_locator() {
        let error = ValidationError::IllegalArrayUsage {
            variable: "params.flags".into(),
            locator: FieldPath::root().field("steps").index(0).field("image"),
            policy: FieldPolicy::NoArray,
        };
        assert_eq!(error.kind(), ErrorKind::IllegalArrayUsage);
        assert_eq!(error.paths(), vec!["steps[0].image".to_string()]);
        assert!(error.to_string().contains("params.flags"));
        assert!(error.details().expect("details").contains("command or args"));
    }

    #[test]
    fn via_field_prefixes_locator() {
        let error = ValidationError::invalid("duplicate", FieldPath::root().field("name")).via_field("volumes");
        assert_eq!(error.locator().to_string(), "volumes.name");
    }
}
