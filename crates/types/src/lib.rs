//! Shared type definitions for taskvet.
//!
//! The [`task`] module holds the serde model of a task document; [`paths`] holds the lexical
//! path helpers used to compute effective mount and resource paths.

pub mod paths;
pub mod task;

pub use task::merge::merge_steps_with_template;
pub use task::*;
