//! Configuration values and provenance.
//!
//! A [`ConfigValue`] is a single named, documented slot holding one piece
//! of configuration data. Every slot remembers which class or instance
//! last set it ([`Definer`]) - provenance is carried purely for
//! documentation and debugging and is never interpreted structurally.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Who most recently set a value or created a group.
///
/// Compared only in tests; the core never branches on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Definer {
    /// Set while a class body was being prepared or finalized.
    Class(String),
    /// Set on an instance-level clone after construction.
    Instance {
        /// Class the instance was built from.
        class: String,
        /// Caller-chosen label, e.g. a student identifier.
        label: String,
    },
}

impl Definer {
    /// Name of the defining class, regardless of level.
    pub fn class_name(&self) -> &str {
        match self {
            Definer::Class(name) => name,
            Definer::Instance { class, .. } => class,
        }
    }
}

impl fmt::Display for Definer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definer::Class(name) => write!(f, "{}", name),
            Definer::Instance { class, label } => write!(f, "{}[{}]", class, label),
        }
    }
}

/// A single configuration slot.
///
/// The `path` is fixed at creation; only `value`, `doc` and `definer`
/// change afterwards (via assignment or merging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigValue {
    /// Opaque payload. Anything serializable goes.
    pub value: Value,
    /// Human-readable description, dedented.
    pub doc: String,
    /// Provenance of the current payload.
    pub definer: Definer,
    path: Vec<String>,
}

impl ConfigValue {
    pub(crate) fn new(value: Value, doc: &str, definer: Definer, path: Vec<String>) -> Self {
        Self {
            value,
            doc: dedent(doc),
            definer,
            path,
        }
    }

    /// Name segments from the root group down to this value.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Dotted rendering of [`path`](Self::path), for messages and docs.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }

    /// Overwrite payload, doc and provenance from another value.
    ///
    /// The merge-source always wins for existing scalars; the doc is
    /// only taken when the source actually provides one.
    pub(crate) fn overwrite_from(&mut self, other: &ConfigValue) {
        self.value = other.value.clone();
        if !other.doc.is_empty() {
            self.doc = other.doc.clone();
        }
        self.definer = other.definer.clone();
    }

    /// Copy with provenance rebound, path preserved.
    pub(crate) fn clone_with(&self, definer: Definer) -> Self {
        Self {
            value: self.value.clone(),
            doc: self.doc.clone(),
            definer,
            path: self.path.clone(),
        }
    }
}

/// Strip the common leading indentation from every line after the first.
///
/// Doc strings are written as indented raw strings inside class bodies;
/// rendered tables and generated pages need them flush-left.
pub fn dedent(text: &str) -> String {
    let trimmed = text.trim_end();
    let mut lines = trimmed.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };

    let margin = trimmed
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::from(first.trim_start());
    for line in trimmed.lines().skip(1) {
        out.push('\n');
        if line.len() >= margin {
            out.push_str(&line[margin..]);
        } else {
            out.push_str(line.trim_start());
        }
    }
    out
}
