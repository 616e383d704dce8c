//! Error types for the configuration core.
//!
//! All violations are authoring-time correctness errors: they are raised
//! synchronously at the point of violation and never caught inside the
//! core, so a half-built configuration tree can never be observed.

use thiserror::Error;

/// Errors raised by the configuration tree and class lifecycle.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A merge found a value and a group under the same name.
    ///
    /// A class must never redefine a value as a group or vice versa, so
    /// this aborts the merge before anything is written.
    #[error("structural mismatch at '{path}': cannot merge {found} into {expected}")]
    StructuralMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// `new_value`/`new_group` called outside the Preparing phase.
    #[error("cannot call {op} on a {state} group '{path}': members may only be added while a class body is being prepared")]
    DefinitionState {
        op: &'static str,
        state: &'static str,
        path: String,
    },

    /// A member name was declared twice within one class body.
    #[error("duplicate member '{name}' in group '{path}'")]
    DuplicateName { name: String, path: String },

    /// Read or write of a name not present in the group.
    #[error("group '{path}' has no member '{name}'")]
    UnknownMember { name: String, path: String },

    /// A member name would shadow the group API surface or is not a
    /// plain identifier.
    #[error("reserved or invalid member name '{name}'")]
    ReservedName { name: String },

    /// Assignment targeted a subgroup name; groups are extended through
    /// `child_mut`, never replaced wholesale.
    #[error("member '{name}' in group '{path}' is a subgroup, not a value")]
    NotAValue { name: String, path: String },

    /// Nested-group access targeted a plain value member.
    #[error("member '{name}' in group '{path}' is a value, not a subgroup")]
    NotAGroup { name: String, path: String },

    /// A class referenced a configuration variable it does not carry.
    #[error("class '{class}' has no configuration variable '{var}'")]
    UnknownVar { class: String, var: String },
}

/// Errors raised by the documentation renderer.
///
/// The renderer is read-only; the only thing that can go wrong is a
/// malformed column template.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A column template referenced a field the renderer does not expose.
    #[error("unknown field '{{{field}}}' in column template '{template}'")]
    UnknownField { field: String, template: String },
}

/// Errors raised during template search-path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("template '{name}' not found in {searched} search directories")]
    NotFound { name: String, searched: usize },

    #[error("search directory '{0}' is not a directory")]
    NotADirectory(std::path::PathBuf),
}
