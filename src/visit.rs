//! Typed depth-first traversal over configuration trees.
//!
//! Consumers that need to walk a whole tree (the documentation renderer,
//! snapshot statistics) implement [`Visitor`] instead of hand-rolling
//! recursion over [`ConfigNode`] variants.

use crate::group::{ConfigGroup, ConfigNode};
use crate::value::ConfigValue;

/// Callbacks for a depth-first walk in definition order.
pub trait Visitor {
    /// Called for every leaf slot.
    fn visit_value(&mut self, name: &str, value: &ConfigValue);

    /// Called when a nested group is reached. Return `false` to skip its
    /// members.
    fn enter_group(&mut self, _name: &str, _group: &ConfigGroup) -> bool {
        true
    }

    /// Called after a nested group's members were visited (or skipped).
    fn leave_group(&mut self, _name: &str, _group: &ConfigGroup) {}
}

/// Drive a visitor over the members of `group`, depth-first, in
/// definition order. The root group itself gets no callback.
pub fn walk<V: Visitor>(group: &ConfigGroup, visitor: &mut V) {
    for (name, node) in group.members() {
        match node {
            ConfigNode::Value(value) => visitor.visit_value(name, value),
            ConfigNode::Group(child) => {
                if visitor.enter_group(name, child) {
                    walk(child, visitor);
                }
                visitor.leave_group(name, child);
            }
        }
    }
}

/// Count leaves and subgroups of a tree. Used by snapshot output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeStats {
    pub values: usize,
    pub groups: usize,
}

impl Visitor for TreeStats {
    fn visit_value(&mut self, _name: &str, _value: &ConfigValue) {
        self.values += 1;
    }

    fn enter_group(&mut self, _name: &str, _group: &ConfigGroup) -> bool {
        self.groups += 1;
        true
    }
}

impl TreeStats {
    pub fn of(group: &ConfigGroup) -> Self {
        let mut stats = TreeStats::default();
        walk(group, &mut stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Definer;
    use serde_json::json;

    fn sample() -> ConfigGroup {
        let mut g = ConfigGroup::new_root("", Definer::Class("Exam".into()));
        g.new_value("points", json!(10), "").unwrap();
        let build = g.new_group("build", "").unwrap();
        build.new_value("runs", json!(2), "").unwrap();
        build.new_value("keep_tex", json!(false), "").unwrap();
        g.new_group("grading", "").unwrap();
        g
    }

    #[test]
    fn walk_visits_in_definition_order() {
        struct Recorder(Vec<String>);
        impl Visitor for Recorder {
            fn visit_value(&mut self, _name: &str, value: &ConfigValue) {
                self.0.push(value.dotted_path());
            }
            fn enter_group(&mut self, _name: &str, group: &ConfigGroup) -> bool {
                self.0.push(format!("[{}]", group.dotted_path()));
                true
            }
        }

        let mut rec = Recorder(Vec::new());
        walk(&sample(), &mut rec);
        assert_eq!(
            rec.0,
            vec!["points", "[build]", "build.runs", "build.keep_tex", "[grading]"]
        );
    }

    #[test]
    fn enter_group_can_prune() {
        struct Shallow(usize);
        impl Visitor for Shallow {
            fn visit_value(&mut self, _name: &str, _value: &ConfigValue) {
                self.0 += 1;
            }
            fn enter_group(&mut self, _name: &str, _group: &ConfigGroup) -> bool {
                false
            }
        }

        let mut shallow = Shallow(0);
        walk(&sample(), &mut shallow);
        assert_eq!(shallow.0, 1); // only the top-level leaf
    }

    #[test]
    fn tree_stats_counts() {
        let stats = TreeStats::of(&sample());
        assert_eq!(stats.values, 3);
        assert_eq!(stats.groups, 2);
    }
}
