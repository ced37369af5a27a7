//! # Placeholder Expansion
//!
//! Generic `$( ... )` placeholder substitution over arbitrary JSON trees.
//!
//! The expander knows nothing about tasks: it walks a [`serde_json::Value`], finds every
//! placeholder inside string leaves, and resolves the dotted path between the delimiters against a
//! JSON context. A path that does not exist in the context is an error naming the expression and
//! the location of the string that held it.
//!
//! ## Syntax
//!
//! - `$(params.revision)` - dotted path lookup
//! - `$(resources.inputs.repo.insecure-skip-tls-verify)` - segments may contain `-`
//! - `$(params.flags[0])` - bracketed numeric indices select list items
//!
//! A string that consists of exactly one placeholder is replaced by the resolved value itself,
//! so a reference to a list stays a list. Placeholders embedded in longer text are rendered as
//! text. An unterminated `$(` is kept verbatim.
//!
//! Indices are strict by default. [`IndexResolution::ShapeOnly`] accepts any index into a list,
//! for contexts whose lists are placeholders rather than real values.
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use taskvet_engine::expand::expand;
//!
//! let context = json!({"params": {"flags": ["-v"], "name": "demo"}});
//! let tree = json!({"args": "$(params.flags)", "title": "run $(params.name)"});
//!
//! let expanded = expand(&tree, &context)?;
//! assert_eq!(expanded["args"], json!(["-v"]));
//! assert_eq!(expanded["title"], "run demo");
//! # Ok::<(), taskvet_engine::expand::ExpansionError>(())
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::error::{FieldPath, ValidationError};

const OPEN: &str = "$(";
const CLOSE: char = ')';

/// Failures raised while expanding a tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpansionError {
    /// The expression names a path that does not exist in the context.
    #[error("undefined variable `{expression}` referenced at {location}")]
    UndefinedVariable { expression: String, location: FieldPath },
}

impl From<ExpansionError> for ValidationError {
    fn from(error: ExpansionError) -> Self {
        match error {
            ExpansionError::UndefinedVariable { expression, location } => ValidationError::UndefinedReference {
                reference: expression,
                locator: location,
            },
        }
    }
}

/// How bracketed indices resolve against list values in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexResolution {
    /// The index must select an existing item.
    #[default]
    Strict,
    /// Any well-formed index into a list resolves, so placeholder lists of any length accept
    /// `[n]`. Positions past the end resolve to an empty string.
    ShapeOnly,
}

static EMPTY_ITEM: Value = Value::String(String::new());

/// Recursively expands every placeholder in `tree` against `context`.
///
/// Object keys are never expanded. Expansion stops at the first unresolved placeholder.
pub fn expand(tree: &Value, context: &Value) -> Result<Value, ExpansionError> {
    expand_with(tree, context, IndexResolution::Strict)
}

/// Like [`expand`], with an explicit rule for list indices.
pub fn expand_with(tree: &Value, context: &Value, indices: IndexResolution) -> Result<Value, ExpansionError> {
    Expander { context, indices }.expand_at(tree, &FieldPath::root())
}

struct Expander<'a> {
    context: &'a Value,
    indices: IndexResolution,
}

impl<'a> Expander<'a> {
    fn expand_at(&self, value: &Value, location: &FieldPath) -> Result<Value, ExpansionError> {
        match value {
            Value::String(text) => self.expand_string(text, location),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(position, item)| self.expand_at(item, &location.clone().index(position)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut expanded = serde_json::Map::new();
                for (key, nested) in map {
                    expanded.insert(key.clone(), self.expand_at(nested, &location.clone().field(key.as_str()))?);
                }
                Ok(Value::Object(expanded))
            }
            _ => Ok(value.clone()),
        }
    }

    fn expand_string(&self, text: &str, location: &FieldPath) -> Result<Value, ExpansionError> {
        if let Some(expression) = whole_placeholder(text) {
            return self.resolve(expression, location).cloned();
        }

        let mut output = String::new();
        let mut remaining = text;

        while let Some(start) = remaining.find(OPEN) {
            let (before, after_open) = remaining.split_at(start);
            output.push_str(before);

            let Some(end) = after_open[OPEN.len()..].find(CLOSE) else {
                // unterminated; keep the tail verbatim
                output.push_str(after_open);
                return Ok(Value::String(output));
            };
            let expression = after_open[OPEN.len()..OPEN.len() + end].trim();
            output.push_str(&format_json_value(self.resolve(expression, location)?));
            remaining = &after_open[OPEN.len() + end + 1..];
        }

        output.push_str(remaining);
        Ok(Value::String(output))
    }

    /// Resolves a dotted path expression against the context.
    fn resolve(&self, expression: &str, location: &FieldPath) -> Result<&'a Value, ExpansionError> {
        let undefined = || ExpansionError::UndefinedVariable {
            expression: expression.to_string(),
            location: location.clone(),
        };

        if expression.is_empty() {
            return Err(undefined());
        }

        let mut current: &'a Value = self.context;
        for segment in expression.split('.') {
            let (key, indices) = split_indices(segment).ok_or_else(undefined)?;
            if !key.is_empty() {
                current = current.as_object().and_then(|map| map.get(key)).ok_or_else(undefined)?;
            }
            for position in indices {
                let items = current.as_array().ok_or_else(undefined)?;
                current = match (items.get(position), self.indices) {
                    (Some(item), _) => item,
                    (None, IndexResolution::ShapeOnly) => &EMPTY_ITEM,
                    (None, IndexResolution::Strict) => return Err(undefined()),
                };
            }
        }
        Ok(current)
    }
}

/// Returns the expression when `text` is exactly one placeholder and nothing else.
fn whole_placeholder(text: &str) -> Option<&str> {
    let inner = text.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    if inner.contains(CLOSE) || inner.contains(OPEN) {
        return None;
    }
    Some(inner.trim())
}

/// Splits `name[0][1]` into its key and indices. Returns `None` for malformed brackets or an
/// entirely empty segment.
fn split_indices(segment: &str) -> Option<(&str, Vec<usize>)> {
    let key_end = segment.find('[').unwrap_or(segment.len());
    let key = &segment[..key_end];
    let mut indices = Vec::new();
    let mut rest = &segment[key_end..];

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        indices.push(inner[..close].trim().parse::<usize>().ok()?);
        rest = &inner[close + 1..];
    }

    if key.is_empty() && indices.is_empty() {
        return None;
    }
    Some((key, indices))
}

/// Renders a resolved value for embedding inside longer text.
///
/// - **Strings**: returned as-is
/// - **Numbers/Booleans**: display representation
/// - **Null**: empty string
/// - **Objects/Arrays**: compact JSON
fn format_json_value(value: &Value) -> String {
    match value {
        Value::String(string_value) => string_value.clone(),
        Value::Number(number_value) => number_value.to_string(),
        Value::Bool(boolean_value) => boolean_value.to_string(),
        Value::Null => String::new(),
        other_value => other_value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> Value {
        json!({
            "params": {"name": "demo", "flags": ["-v", "-x"], "count": 3},
            "resources": {"inputs": {"repo": {"path": "/workspace/repo", "insecure-skip-tls-verify": ""}}}
        })
    }

    #[test]
    fn expands_embedded_placeholders_as_text() {
        let expanded = expand(&json!("deploy $(params.name) x$(params.count)"), &context()).expect("expands");
        assert_eq!(expanded, json!("deploy demo x3"));
    }

    #[test]
    fn whole_placeholder_keeps_value_shape() {
        let expanded = expand(&json!({"args": "$(params.flags)"}), &context()).expect("expands");
        assert_eq!(expanded["args"], json!(["-v", "-x"]));

        let expanded = expand(&json!("$( params.flags[1] )"), &context()).expect("expands");
        assert_eq!(expanded, json!("-x"));
    }

    #[test]
    fn embedded_list_renders_as_json() {
        let expanded = expand(&json!("flags=$(params.flags)"), &context()).expect("expands");
        assert_eq!(expanded, json!(r#"flags=["-v","-x"]"#));
    }

    #[test]
    fn hyphenated_segments_resolve() {
        let expanded = expand(&json!("$(resources.inputs.repo.insecure-skip-tls-verify)"), &context()).expect("expands");
        assert_eq!(expanded, json!(""));
    }

    #[test]
    fn undefined_reference_reports_expression_and_location() {
        let tree = json!({"steps": [{"image": "ok"}, {"args": ["fine", "$(params.missing)"]}]});
        let error = expand(&tree, &context()).expect_err("missing param");
        let ExpansionError::UndefinedVariable { expression, location } = error;
        assert_eq!(expression, "params.missing");
        assert_eq!(location.to_string(), "steps[1].args[1]");
    }

    #[test]
    fn descending_into_scalars_or_past_list_end_is_undefined() {
        assert!(expand(&json!("$(params.name.path)"), &context()).is_err());
        assert!(expand(&json!("$(params.flags[5])"), &context()).is_err());
        assert!(expand(&json!("$(params.flags[x])"), &context()).is_err());
        assert!(expand(&json!("$()"), &context()).is_err());
    }

    #[test]
    fn shape_only_indices_accept_any_position_into_a_list() {
        let context = json!({"params": {"flags": [], "name": "demo"}});

        let expanded = expand_with(&json!("$(params.flags[0])"), &context, IndexResolution::ShapeOnly).expect("expands");
        assert_eq!(expanded, json!(""));
        let expanded = expand_with(&json!("--flag=$(params.flags[3])"), &context, IndexResolution::ShapeOnly).expect("expands");
        assert_eq!(expanded, json!("--flag="));

        assert!(expand(&json!("$(params.flags[0])"), &context).is_err());
        assert!(expand_with(&json!("$(params.name[0])"), &context, IndexResolution::ShapeOnly).is_err());
        assert!(expand_with(&json!("$(params.flags[x])"), &context, IndexResolution::ShapeOnly).is_err());
        assert!(expand_with(&json!("$(params.flags[0].path)"), &context, IndexResolution::ShapeOnly).is_err());
    }

    #[test]
    fn unterminated_placeholder_is_preserved() {
        let expanded = expand(&json!("Value: $(params.name"), &context()).expect("expands");
        assert_eq!(expanded, json!("Value: $(params.name"));
    }

    #[test]
    fn object_keys_and_non_strings_are_untouched() {
        let tree = json!({"$(params.name)": 1, "flag": true, "none": null});
        assert_eq!(expand(&tree, &context()).expect("expands"), tree);
    }
}
