//! Declared parameter names.

use indexmap::IndexSet;
use taskvet_types::{ParamSpec, ParamType};

/// Parameter names declared by a task, split by type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredNames {
    /// Every declared parameter name, in declaration order.
    pub all: IndexSet<String>,
    /// The subset whose declared type is `array`.
    pub arrays: IndexSet<String>,
}

impl DeclaredNames {
    /// Collects names from parameter declarations. Absent parameters yield empty sets.
    pub fn from_params(params: &[ParamSpec]) -> Self {
        let mut names = DeclaredNames::default();
        for param in params {
            names.all.insert(param.name.clone());
            if param.r#type == ParamType::Array {
                names.arrays.insert(param.name.clone());
            }
        }
        names
    }
}
