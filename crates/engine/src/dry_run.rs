//! Expansion dry run.
//!
//! Serializes the whole task spec to a JSON tree and expands it against the validation-time
//! [`LookupContext`]. The expanded output is discarded; the pass exists to prove that every
//! placeholder anywhere in the spec, declarations included, resolves.

use serde_json::Value;
use taskvet_types::TaskSpec;
use tracing::debug;

use crate::context::LookupContext;
use crate::error::{FieldPath, ValidationError};
use crate::expand::{IndexResolution, expand_with};

/// Checks that every placeholder in `spec` names a path the lookup context provides.
pub fn validate_expansion(spec: &TaskSpec) -> Result<(), ValidationError> {
    let context = LookupContext::from_spec(spec).to_value();
    let tree = spec_tree(spec)?;

    // Array params hold placeholder lists, so an index is checked for form, not range.
    expand_with(&tree, &context, IndexResolution::ShapeOnly)?;
    debug!("expansion dry run resolved every reference");
    Ok(())
}

fn spec_tree(spec: &TaskSpec) -> Result<Value, ValidationError> {
    serde_json::to_value(spec).map_err(|error| ValidationError::MalformedDeclaration {
        locator: FieldPath::root(),
        reason: error.to_string(),
    })
}
