//! examforge - document-generation framework for personalized exams.
//!
//! The crate's core is a hierarchical, documented, inheritance-aware
//! configuration system: a base class declares typed configuration
//! fields, subclasses extend or override them, and object instances
//! override them again at runtime - with a strict rule for which
//! definition wins at each level.
//!
//! # Features
//! - Ordered, documented configuration trees ([`ConfigGroup`] /
//!   [`ConfigValue`]) with provenance tracking
//! - A three-phase class lifecycle ([`ClassBuilder`] -> [`ConfigClass`]
//!   -> [`ConfigInstance`]): preparation with ancestor merging, frozen
//!   finalization, isolated per-instance clones
//! - Recursive source-wins merging with atomic failure on structural
//!   mismatches
//! - A documentation renderer producing embeddable tables from any
//!   finalized tree
//! - Deterministic seed derivation and template search-path resolution
//!   for the surrounding build pipeline
//!
//! # Example
//! ```
//! use examforge::{ClassBuilder, VarSpec};
//! use serde_json::json;
//!
//! let mut base = ClassBuilder::root("Exam", vec![VarSpec::new("settings", "")]);
//! base.var_mut("settings")?
//!     .new_value("points", json!(10), "Total points.")?;
//! let exam = base.finalize()?;
//!
//! let mut student = exam.instantiate("student-42");
//! student.var_mut("settings")?.set("points", json!(12))?;
//!
//! assert_eq!(exam.var("settings")?.value("points")?, &json!(10));
//! assert_eq!(student.var("settings")?.value("points")?, &json!(12));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod class;
pub mod error;
pub mod exam;
pub mod group;
pub mod paths;
pub mod render;
pub mod seed;
pub mod value;
pub mod visit;

pub use class::{ClassBuilder, ConfigClass, ConfigInstance, VarSpec};
pub use error::{ConfigError, PathError, RenderError};
pub use group::{ConfigGroup, ConfigNode, GroupMode};
pub use render::{render, ColumnSpec, RenderOptions};
pub use value::{ConfigValue, Definer};
