//! The class lifecycle: Preparing -> Finalized -> Instantiated.
//!
//! A config-bearing class carries one [`ConfigGroup`] per configuration
//! variable ("settings", "metadata", ...). The lifecycle guarantees:
//! - while a class body runs ([`ClassBuilder`]), its groups are open for
//!   member registration and every ancestor's finalized state has already
//!   been merged in as defaults;
//! - once finalized ([`ConfigClass`]), the groups are frozen and published
//!   behind `Arc` - nothing can observe a partially-merged tree;
//! - every instance ([`ConfigInstance`]) gets a private deep clone, so
//!   instance writes never reach the class default or sibling instances.
//!
//! Precedence is uniform: the most-derived, most-recent definition wins.
//! Among multiple parents, the earliest-listed one wins diamond
//! conflicts; the class body itself overrides everything inherited.

use crate::error::{ConfigError, RenderError};
use crate::group::{ConfigGroup, GroupMode};
use crate::render::{render, RenderOptions};
use crate::value::Definer;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Declaration of one configuration variable a class hierarchy carries.
///
/// This is what the original superclass factory was parameterized on:
/// the variable's name, its top-level doc, and how to render its
/// documentation table.
#[derive(Debug, Clone)]
pub struct VarSpec {
    pub name: String,
    pub doc: String,
    pub render: RenderOptions,
}

impl VarSpec {
    pub fn new(name: &str, doc: &str) -> Self {
        Self {
            name: name.to_string(),
            doc: doc.to_string(),
            render: RenderOptions::default(),
        }
    }

    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }
}

/// A class whose body is currently executing.
///
/// Created by [`root`](ClassBuilder::root) for a hierarchy's base class
/// or by [`derive`](ClassBuilder::derive) for subclasses; consumed by
/// [`finalize`](ClassBuilder::finalize).
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    parents: Vec<Arc<ConfigClass>>,
    specs: Vec<VarSpec>,
    vars: Vec<(String, ConfigGroup)>,
}

impl ClassBuilder {
    /// Start a hierarchy: a base class declaring its configuration
    /// variables with fresh, empty groups.
    pub fn root(name: &str, specs: Vec<VarSpec>) -> Self {
        debug!(class = name, vars = specs.len(), "preparing root class");
        let vars = specs
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    ConfigGroup::new_root(&spec.doc, Definer::Class(name.to_string())),
                )
            })
            .collect();
        Self {
            name: name.to_string(),
            parents: Vec::new(),
            specs,
            vars,
        }
    }

    /// Start a subclass body.
    ///
    /// The new class carries the union of its parents' variables. For
    /// each variable a fresh group is created and every parent's frozen
    /// group is merged in as defaults; parents are merged latest-listed
    /// first, so the earliest-listed parent wins diamond conflicts.
    pub fn derive(name: &str, parents: &[&Arc<ConfigClass>]) -> Result<Self, ConfigError> {
        debug!(class = name, parents = parents.len(), "preparing subclass");
        let mut specs: Vec<VarSpec> = Vec::new();
        for parent in parents {
            for spec in &parent.specs {
                if !specs.iter().any(|s| s.name == spec.name) {
                    specs.push(spec.clone());
                }
            }
        }

        let mut vars = Vec::with_capacity(specs.len());
        for spec in &specs {
            let mut group =
                ConfigGroup::new_root(&spec.doc, Definer::Class(name.to_string()));
            for parent in parents.iter().rev() {
                if let Some(frozen) = parent.frozen_var(&spec.name) {
                    group.update(frozen)?;
                }
            }
            vars.push((spec.name.clone(), group));
        }

        Ok(Self {
            name: name.to_string(),
            parents: parents.iter().map(|&p| Arc::clone(p)).collect(),
            specs,
            vars,
        })
    }

    /// Declare an additional configuration variable on a subclass.
    ///
    /// Fails when a parent already carries a variable of that name.
    pub fn add_var(&mut self, spec: VarSpec) -> Result<(), ConfigError> {
        if self.specs.iter().any(|s| s.name == spec.name) {
            return Err(ConfigError::DuplicateName {
                name: spec.name.clone(),
                path: self.name.clone(),
            });
        }
        self.vars.push((
            spec.name.clone(),
            ConfigGroup::new_root(&spec.doc, Definer::Class(self.name.clone())),
        ));
        self.specs.push(spec);
        Ok(())
    }

    /// The "class body" handle for one variable: `new_value`,
    /// `new_group`, and plain `set` overrides of inherited defaults all
    /// go through here.
    pub fn var_mut(&mut self, var: &str) -> Result<&mut ConfigGroup, ConfigError> {
        let class = self.name.clone();
        self.vars
            .iter_mut()
            .find(|(name, _)| name == var)
            .map(|(_, group)| group)
            .ok_or(ConfigError::UnknownVar {
                class,
                var: var.to_string(),
            })
    }

    /// End of the class body: freeze every group, render its
    /// documentation, publish the class.
    pub fn finalize(mut self) -> Result<Arc<ConfigClass>, RenderError> {
        debug!(class = %self.name, "finalizing class");
        for (_, group) in &mut self.vars {
            group.freeze();
        }

        let mut docs = Vec::with_capacity(self.vars.len());
        for (name, group) in &self.vars {
            let spec = self
                .specs
                .iter()
                .find(|s| s.name == *name)
                .expect("spec exists for every var");
            let table = render(group, &spec.render)?;
            let text = if table.is_empty() {
                spec.doc.clone()
            } else if spec.doc.is_empty() {
                table
            } else {
                format!("{}\n\n{}", spec.doc, table)
            };
            docs.push((name.clone(), text));
        }

        Ok(Arc::new(ConfigClass {
            name: self.name,
            parents: self.parents,
            specs: self.specs,
            vars: self
                .vars
                .into_iter()
                .map(|(name, group)| (name, Arc::new(group)))
                .collect(),
            docs,
        }))
    }
}

/// A finalized, immutable class: frozen configuration plus rendered
/// documentation, shared by reference with subclasses and instances.
#[derive(Debug)]
pub struct ConfigClass {
    name: String,
    parents: Vec<Arc<ConfigClass>>,
    specs: Vec<VarSpec>,
    vars: Vec<(String, Arc<ConfigGroup>)>,
    docs: Vec<(String, String)>,
}

impl ConfigClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> &[Arc<ConfigClass>] {
        &self.parents
    }

    /// Names of the configuration variables this class carries.
    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(name, _)| name.as_str())
    }

    /// The frozen tree for one variable.
    pub fn var(&self, var: &str) -> Result<&Arc<ConfigGroup>, ConfigError> {
        self.vars
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, group)| group)
            .ok_or(ConfigError::UnknownVar {
                class: self.name.clone(),
                var: var.to_string(),
            })
    }

    fn frozen_var(&self, var: &str) -> Option<&ConfigGroup> {
        self.vars
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, group)| group.as_ref())
    }

    /// Rendered documentation for one variable.
    pub fn doc(&self, var: &str) -> Option<&str> {
        self.docs
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, text)| text.as_str())
    }

    /// Construct an instance: every frozen group is deep-cloned with
    /// provenance rebound to the instance.
    pub fn instantiate(self: &Arc<Self>, label: &str) -> ConfigInstance {
        debug!(class = %self.name, label, "instantiating");
        let definer = Definer::Instance {
            class: self.name.clone(),
            label: label.to_string(),
        };
        let vars = self
            .vars
            .iter()
            .map(|(name, group)| {
                (
                    name.clone(),
                    group.clone_with(definer.clone(), GroupMode::Instance),
                )
            })
            .collect();
        ConfigInstance {
            class: Arc::clone(self),
            label: label.to_string(),
            vars,
        }
    }
}

/// A constructed object: private configuration clones, fully independent
/// of the class default and of any sibling instance.
#[derive(Debug)]
pub struct ConfigInstance {
    class: Arc<ConfigClass>,
    label: String,
    vars: Vec<(String, ConfigGroup)>,
}

impl ConfigInstance {
    pub fn class(&self) -> &Arc<ConfigClass> {
        &self.class
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Read access to one variable's tree.
    pub fn var(&self, var: &str) -> Result<&ConfigGroup, ConfigError> {
        self.vars
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, group)| group)
            .ok_or(ConfigError::UnknownVar {
                class: self.class.name().to_string(),
                var: var.to_string(),
            })
    }

    /// Write access to one variable's tree.
    pub fn var_mut(&mut self, var: &str) -> Result<&mut ConfigGroup, ConfigError> {
        let class = self.class.name().to_string();
        self.vars
            .iter_mut()
            .find(|(name, _)| name == var)
            .map(|(_, group)| group)
            .ok_or(ConfigError::UnknownVar {
                class,
                var: var.to_string(),
            })
    }

    /// Flatten every variable into one nested mapping, for debug
    /// snapshots.
    pub fn snapshot(&self) -> Value {
        let mut map = Map::new();
        for (name, group) in &self.vars {
            map.insert(name.clone(), group.value_dict());
        }
        Value::Object(map)
    }
}
