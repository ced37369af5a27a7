//! Textual classification of parameter references.
//!
//! These helpers answer questions about the raw, unexpanded text of a field: whether it mentions
//! any parameter out of a given set, and whether such a mention is the whole field. They never
//! resolve anything, so they work the same whether or not the context would resolve the reference.
//!
//! Both the current `$(params.<name>)` form and the legacy `$(inputs.params.<name>)` form are
//! recognized. A reference with a bracketed index such as `$(params.flags[0])` selects one item
//! and is therefore treated as a scalar reference, not a reference to the array itself.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

static PARAM_REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\(\s*((?:inputs\.)?params\.([A-Za-z0-9_-]+))(\[[^\]]*\])?\s*\)").expect("param reference regex should compile")
});

/// A whole-value reference to one of the queried parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamReference {
    /// The referenced path as written, for example `inputs.params.flags`.
    pub path: String,
    /// The bare parameter name.
    pub name: String,
    /// Byte range of the full placeholder inside the field.
    pub span: std::ops::Range<usize>,
}

/// Lists every unindexed reference in `value` to a parameter named in `names`, in order.
pub fn param_references(value: &str, names: &IndexSet<String>) -> Vec<ParamReference> {
    PARAM_REFERENCE_REGEX
        .captures_iter(value)
        .filter(|captures| captures.get(3).is_none())
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let path = captures.get(1)?;
            let name = captures.get(2)?;
            names.contains(name.as_str()).then(|| ParamReference {
                path: path.as_str().to_string(),
                name: name.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Returns the first referenced path when `value` mentions any parameter from `names`.
pub fn references_any(value: &str, names: &IndexSet<String>) -> Option<String> {
    param_references(value, names).into_iter().next().map(|reference| reference.path)
}

/// True when `value` is exactly one reference to `name` with no other content.
pub fn is_isolated_reference(value: &str, name: &str) -> bool {
    let names: IndexSet<String> = IndexSet::from([name.to_string()]);
    match param_references(value, &names).as_slice() {
        [only] => only.span == (0..value.len()),
        _ => false,
    }
}
