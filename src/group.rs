//! The configuration tree.
//!
//! A [`ConfigGroup`] is an ordered mapping from names to either a
//! [`ConfigValue`] or a nested [`ConfigGroup`]. Groups support:
//! - member registration while a class body is being prepared
//!   ([`new_value`](ConfigGroup::new_value) / [`new_group`](ConfigGroup::new_group))
//! - read/write access to payloads ([`value`](ConfigGroup::value) /
//!   [`set`](ConfigGroup::set))
//! - recursive source-wins merging ([`update`](ConfigGroup::update))
//! - deep cloning with rebound provenance ([`clone_with`](ConfigGroup::clone_with))
//! - flattening into a plain nested mapping ([`value_dict`](ConfigGroup::value_dict))
//!
//! Merges are atomic: a structural mismatch anywhere in the source leaves
//! the target untouched.

use crate::error::ConfigError;
use crate::value::{dedent, ConfigValue, Definer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::trace;

/// Member names that would shadow the group API surface in generated
/// docs and snapshots.
static RESERVED_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "new_value",
        "new_group",
        "update",
        "clone",
        "value",
        "value_dict",
        "set",
        "child",
        "members",
        "doc",
        "definer",
        "path",
        "root",
        "mode",
    ]
    .iter()
    .copied()
    .collect()
});

/// What a group currently is in the class lifecycle.
///
/// Member registration is only legal in `Defining`. Payload writes stay
/// legal on instance clones; the frozen class tree is never written
/// again, subclasses merge it into their own fresh tree instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// A class body is executing; `new_value`/`new_group` are open.
    Defining,
    /// The class body finished; this is the class's authoritative tree.
    Frozen,
    /// A per-instance clone; structure is fixed, payloads are not.
    Instance,
}

impl GroupMode {
    fn as_str(self) -> &'static str {
        match self {
            GroupMode::Defining => "defining",
            GroupMode::Frozen => "frozen",
            GroupMode::Instance => "instance",
        }
    }
}

/// A single member: a leaf slot or a nested subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Value(ConfigValue),
    Group(ConfigGroup),
}

impl ConfigNode {
    /// Static kind name, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigNode::Value(_) => "value",
            ConfigNode::Group(_) => "group",
        }
    }
}

/// An ordered, documented configuration tree.
///
/// Members keep definition order; names are unique within one group.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigGroup {
    members: Vec<(String, ConfigNode)>,
    doc: String,
    definer: Definer,
    path: Vec<String>,
    mode: GroupMode,
}

impl ConfigGroup {
    /// Create an empty top-level group in definition mode.
    pub fn new_root(doc: &str, definer: Definer) -> Self {
        Self {
            members: Vec::new(),
            doc: dedent(doc),
            definer,
            path: Vec::new(),
            mode: GroupMode::Defining,
        }
    }

    /// Register a new leaf slot.
    ///
    /// Fails when the group is not in definition mode, the name already
    /// exists, or the name is reserved/not an identifier.
    pub fn new_value(&mut self, name: &str, default: Value, doc: &str) -> Result<(), ConfigError> {
        self.check_definable("new_value", name)?;
        let mut path = self.path.clone();
        path.push(name.to_string());
        trace!(path = %path.join("."), "register value");
        self.members.push((
            name.to_string(),
            ConfigNode::Value(ConfigValue::new(default, doc, self.definer.clone(), path)),
        ));
        Ok(())
    }

    /// Register a new nested group and return it for population.
    pub fn new_group(&mut self, name: &str, doc: &str) -> Result<&mut ConfigGroup, ConfigError> {
        self.check_definable("new_group", name)?;
        let mut path = self.path.clone();
        path.push(name.to_string());
        trace!(path = %path.join("."), "register group");
        let group = ConfigGroup {
            members: Vec::new(),
            doc: dedent(doc),
            definer: self.definer.clone(),
            path,
            mode: GroupMode::Defining,
        };
        self.members.push((name.to_string(), ConfigNode::Group(group)));
        match &mut self.members.last_mut().expect("just pushed").1 {
            ConfigNode::Group(g) => Ok(g),
            ConfigNode::Value(_) => unreachable!(),
        }
    }

    fn check_definable(&self, op: &'static str, name: &str) -> Result<(), ConfigError> {
        if self.mode != GroupMode::Defining {
            return Err(ConfigError::DefinitionState {
                op,
                state: self.mode.as_str(),
                path: self.dotted_path(),
            });
        }
        if !is_identifier(name) || RESERVED_NAMES.contains(name) {
            return Err(ConfigError::ReservedName {
                name: name.to_string(),
            });
        }
        if self.contains(name) {
            return Err(ConfigError::DuplicateName {
                name: name.to_string(),
                path: self.dotted_path(),
            });
        }
        Ok(())
    }

    /// Read a leaf payload directly (not the wrapper).
    pub fn value(&self, name: &str) -> Result<&Value, ConfigError> {
        match self.get(name) {
            Some(ConfigNode::Value(v)) => Ok(&v.value),
            Some(ConfigNode::Group(_)) => Err(ConfigError::NotAValue {
                name: name.to_string(),
                path: self.dotted_path(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    /// Read the full slot, wrapper included.
    pub fn value_entry(&self, name: &str) -> Result<&ConfigValue, ConfigError> {
        match self.get(name) {
            Some(ConfigNode::Value(v)) => Ok(v),
            Some(ConfigNode::Group(_)) => Err(ConfigError::NotAValue {
                name: name.to_string(),
                path: self.dotted_path(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    /// Overwrite a leaf payload and rebind its provenance to the group's
    /// current context (the class being defined, or the instance).
    ///
    /// Writing to a subgroup name or an unknown name fails; structure is
    /// only changed through `new_value`/`new_group` and merging.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ConfigError> {
        let definer = self.definer.clone();
        let path = self.dotted_path();
        let Some(idx) = self.position(name) else {
            return Err(self.unknown(name));
        };
        match &mut self.members[idx].1 {
            ConfigNode::Value(v) => {
                v.value = value;
                v.definer = definer;
                Ok(())
            }
            ConfigNode::Group(_) => Err(ConfigError::NotAValue {
                name: name.to_string(),
                path,
            }),
        }
    }

    /// Access a nested group.
    pub fn child(&self, name: &str) -> Result<&ConfigGroup, ConfigError> {
        match self.get(name) {
            Some(ConfigNode::Group(g)) => Ok(g),
            Some(ConfigNode::Value(_)) => Err(ConfigError::NotAGroup {
                name: name.to_string(),
                path: self.dotted_path(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    /// Mutable access to a nested group.
    pub fn child_mut(&mut self, name: &str) -> Result<&mut ConfigGroup, ConfigError> {
        let path = self.dotted_path();
        let Some(idx) = self.position(name) else {
            return Err(self.unknown(name));
        };
        match &mut self.members[idx].1 {
            ConfigNode::Group(g) => Ok(g),
            ConfigNode::Value(_) => Err(ConfigError::NotAGroup {
                name: name.to_string(),
                path,
            }),
        }
    }

    /// Raw member lookup.
    pub fn get(&self, name: &str) -> Option<&ConfigNode> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|(n, _)| n == name)
    }

    /// Whether a member with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|(n, _)| n == name)
    }

    /// Members in definition order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.members.iter().map(|(n, node)| (n.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn definer(&self) -> &Definer {
        &self.definer
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    /// Name segments from the root group; empty for the root itself.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Dotted rendering of the path; `"<root>"` for the root group.
    pub fn dotted_path(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(".")
        }
    }

    fn unknown(&self, name: &str) -> ConfigError {
        ConfigError::UnknownMember {
            name: name.to_string(),
            path: self.dotted_path(),
        }
    }

    /// Merge `other` into `self`, source wins on conflicts.
    ///
    /// Members only in `other` are deep-copied in (doc and provenance
    /// preserved, paths rewritten under `self`). Members present in both
    /// are overwritten when scalar and merged recursively when groups.
    /// A kind mismatch under any shared name aborts the whole merge with
    /// `self` unchanged.
    pub fn update(&mut self, other: &ConfigGroup) -> Result<(), ConfigError> {
        self.check_compatible(other)?;
        self.apply_update(other);
        Ok(())
    }

    fn check_compatible(&self, other: &ConfigGroup) -> Result<(), ConfigError> {
        for (name, theirs) in other.members() {
            match (self.get(name), theirs) {
                (Some(ConfigNode::Group(ours)), ConfigNode::Group(theirs)) => {
                    ours.check_compatible(theirs)?;
                }
                (Some(ours), theirs) if ours.kind() != theirs.kind() => {
                    let mut path = self.path.clone();
                    path.push(name.to_string());
                    return Err(ConfigError::StructuralMismatch {
                        path: path.join("."),
                        expected: ours.kind(),
                        found: theirs.kind(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn apply_update(&mut self, other: &ConfigGroup) {
        if !other.doc.is_empty() {
            self.doc = other.doc.clone();
        }
        for (name, theirs) in &other.members {
            match self.position(name) {
                Some(idx) => match (&mut self.members[idx].1, theirs) {
                    (ConfigNode::Value(ours), ConfigNode::Value(v)) => ours.overwrite_from(v),
                    (ConfigNode::Group(ours), ConfigNode::Group(g)) => ours.apply_update(g),
                    _ => unreachable!("checked by check_compatible"),
                },
                None => {
                    let mut path = self.path.clone();
                    path.push(name.clone());
                    let mode = self.mode;
                    self.members
                        .push((name.clone(), copy_node_at(theirs, path, mode)));
                }
            }
        }
    }

    /// Structurally identical, independently mutable deep copy.
    ///
    /// Group provenance is rebound throughout; value provenance is kept,
    /// so `defined_in` columns keep pointing at the class that actually
    /// set each default until the clone writes over it.
    pub fn clone_with(&self, definer: Definer, mode: GroupMode) -> ConfigGroup {
        ConfigGroup {
            members: self
                .members
                .iter()
                .map(|(name, node)| {
                    let node = match node {
                        ConfigNode::Value(v) => ConfigNode::Value(v.clone()),
                        ConfigNode::Group(g) => {
                            ConfigNode::Group(g.clone_with(definer.clone(), mode))
                        }
                    };
                    (name.clone(), node)
                })
                .collect(),
            doc: self.doc.clone(),
            definer,
            path: self.path.clone(),
            mode,
        }
    }

    /// Close definition mode recursively. Called once per class, after
    /// the class body finished executing.
    pub(crate) fn freeze(&mut self) {
        self.mode = GroupMode::Frozen;
        for (_, node) in &mut self.members {
            if let ConfigNode::Group(g) = node {
                g.freeze();
            }
        }
    }

    /// Flatten into a plain nested mapping from name to payload.
    pub fn value_dict(&self) -> Value {
        let mut map = Map::new();
        for (name, node) in &self.members {
            let entry = match node {
                ConfigNode::Value(v) => v.value.clone(),
                ConfigNode::Group(g) => g.value_dict(),
            };
            map.insert(name.clone(), entry);
        }
        Value::Object(map)
    }
}

/// Deep-copy a member under a new path prefix, preserving doc and
/// provenance. Used when a merge introduces members the target lacks.
fn copy_node_at(node: &ConfigNode, path: Vec<String>, mode: GroupMode) -> ConfigNode {
    match node {
        ConfigNode::Value(v) => ConfigNode::Value(ConfigValue::new(
            v.value.clone(),
            &v.doc,
            v.definer.clone(),
            path,
        )),
        ConfigNode::Group(g) => {
            let members = g
                .members
                .iter()
                .map(|(name, child)| {
                    let mut child_path = path.clone();
                    child_path.push(name.clone());
                    (name.clone(), copy_node_at(child, child_path, mode))
                })
                .collect();
            ConfigNode::Group(ConfigGroup {
                members,
                doc: g.doc.clone(),
                definer: g.definer.clone(),
                path,
                mode,
            })
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn defining_group() -> ConfigGroup {
        ConfigGroup::new_root("test group", Definer::Class("Exam".into()))
    }

    #[test]
    fn registration_keeps_order_and_paths() {
        let mut g = defining_group();
        g.new_value("points", json!(10), "total points").unwrap();
        let build = g.new_group("build", "build options").unwrap();
        build.new_value("latex_runs", json!(2), "passes").unwrap();
        g.new_value("shuffle", json!(true), "").unwrap();

        let names: Vec<_> = g.members().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["points", "build", "shuffle"]);
        assert_eq!(
            g.child("build").unwrap().value_entry("latex_runs").unwrap().path(),
            ["build", "latex_runs"]
        );
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut g = defining_group();
        g.new_value("points", json!(1), "").unwrap();
        let err = g.new_value("points", json!(2), "").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { .. }));
        // Same name as a group is just as much a duplicate.
        let err = g.new_group("points", "").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { .. }));
    }

    #[test_case("new_value")]
    #[test_case("update")]
    #[test_case("value_dict")]
    #[test_case("clone")]
    fn reserved_names_rejected(name: &str) {
        let mut g = defining_group();
        let err = g.new_value(name, json!(0), "").unwrap_err();
        assert!(matches!(err, ConfigError::ReservedName { .. }));
    }

    #[test_case(""; "empty")]
    #[test_case("1abc"; "leading digit")]
    #[test_case("has space"; "space")]
    #[test_case("dot.ted"; "dot")]
    fn non_identifiers_rejected(name: &str) {
        let mut g = defining_group();
        assert!(matches!(
            g.new_value(name, json!(0), ""),
            Err(ConfigError::ReservedName { .. })
        ));
    }

    #[test]
    fn set_rebinds_definer() {
        let mut g = defining_group();
        g.new_value("points", json!(10), "").unwrap();
        g.freeze();
        let mut inst = g.clone_with(
            Definer::Instance {
                class: "Exam".into(),
                label: "s1".into(),
            },
            GroupMode::Instance,
        );
        inst.set("points", json!(15)).unwrap();
        assert_eq!(inst.value("points").unwrap(), &json!(15));
        assert_eq!(
            inst.value_entry("points").unwrap().definer.to_string(),
            "Exam[s1]"
        );
        // The frozen class tree is untouched.
        assert_eq!(g.value("points").unwrap(), &json!(10));
    }

    #[test]
    fn set_rejects_groups_and_unknowns() {
        let mut g = defining_group();
        g.new_group("build", "").unwrap();
        assert!(matches!(
            g.set("build", json!(1)),
            Err(ConfigError::NotAValue { .. })
        ));
        assert!(matches!(
            g.set("missing", json!(1)),
            Err(ConfigError::UnknownMember { .. })
        ));
    }

    #[test]
    fn new_value_gated_after_freeze() {
        let mut g = defining_group();
        g.freeze();
        let err = g.new_value("late", json!(0), "").unwrap_err();
        match err {
            ConfigError::DefinitionState { op, state, .. } => {
                assert_eq!(op, "new_value");
                assert_eq!(state, "frozen");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn update_disjoint_is_union() {
        let mut a = defining_group();
        a.new_value("x", json!(1), "x doc").unwrap();
        let mut b = ConfigGroup::new_root("", Definer::Class("Quiz".into()));
        b.new_value("y", json!(2), "y doc").unwrap();

        a.update(&b).unwrap();
        assert_eq!(a.value("x").unwrap(), &json!(1));
        assert_eq!(a.value("y").unwrap(), &json!(2));
        // Copied member keeps its provenance and gets a path under `a`.
        let y = a.value_entry("y").unwrap();
        assert_eq!(y.definer.to_string(), "Quiz");
        assert_eq!(y.path(), ["y"]);
        assert_eq!(y.doc, "y doc");
    }

    #[test]
    fn update_source_wins_on_conflict() {
        let mut a = defining_group();
        a.new_value("x", json!(1), "old").unwrap();
        let mut b = ConfigGroup::new_root("", Definer::Class("Quiz".into()));
        b.new_value("x", json!(99), "new").unwrap();

        a.update(&b).unwrap();
        let x = a.value_entry("x").unwrap();
        assert_eq!(x.value, json!(99));
        assert_eq!(x.doc, "new");
        assert_eq!(x.definer.to_string(), "Quiz");
    }

    #[test]
    fn update_mismatch_fails_without_partial_merge() {
        let mut a = defining_group();
        a.new_value("alpha", json!(1), "").unwrap();
        a.new_value("grade", json!(0), "").unwrap();

        let mut b = ConfigGroup::new_root("", Definer::Class("Quiz".into()));
        b.new_value("alpha", json!(2), "").unwrap();
        b.new_group("grade", "").unwrap();

        let before = a.clone();
        let err = a.update(&b).unwrap_err();
        assert!(matches!(err, ConfigError::StructuralMismatch { .. }));
        // `alpha` would have merged cleanly; atomicity demands it did not.
        assert_eq!(a, before);
    }

    #[test]
    fn update_recurses_into_groups() {
        let mut a = defining_group();
        a.new_group("build", "").unwrap().new_value("runs", json!(1), "").unwrap();
        let mut b = ConfigGroup::new_root("", Definer::Class("Quiz".into()));
        let bb = b.new_group("build", "").unwrap();
        bb.new_value("runs", json!(3), "").unwrap();
        bb.new_value("keep_tex", json!(false), "").unwrap();

        a.update(&b).unwrap();
        let build = a.child("build").unwrap();
        assert_eq!(build.value("runs").unwrap(), &json!(3));
        assert_eq!(build.value("keep_tex").unwrap(), &json!(false));
        assert_eq!(
            build.value_entry("keep_tex").unwrap().path(),
            ["build", "keep_tex"]
        );
    }

    #[test]
    fn value_dict_flattens_recursively() {
        let mut g = defining_group();
        g.new_value("points", json!(10), "").unwrap();
        let build = g.new_group("build", "").unwrap();
        build.new_value("runs", json!(2), "").unwrap();

        assert_eq!(
            g.value_dict(),
            json!({"points": 10, "build": {"runs": 2}})
        );
    }

    #[test]
    fn clone_with_is_independent() {
        let mut g = defining_group();
        g.new_value("points", json!(10), "").unwrap();
        g.freeze();

        let mut i1 = g.clone_with(
            Definer::Instance {
                class: "Exam".into(),
                label: "a".into(),
            },
            GroupMode::Instance,
        );
        let i2 = g.clone_with(
            Definer::Instance {
                class: "Exam".into(),
                label: "b".into(),
            },
            GroupMode::Instance,
        );
        i1.set("points", json!(99)).unwrap();
        assert_eq!(i2.value("points").unwrap(), &json!(10));
        assert_eq!(g.value("points").unwrap(), &json!(10));
    }

    #[test]
    fn instance_clone_cannot_define() {
        let mut g = defining_group();
        g.freeze();
        let mut inst = g.clone_with(
            Definer::Instance {
                class: "Exam".into(),
                label: "s".into(),
            },
            GroupMode::Instance,
        );
        match inst.new_group("late", "").unwrap_err() {
            ConfigError::DefinitionState { state, .. } => assert_eq!(state, "instance"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
