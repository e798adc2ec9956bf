//! Named schema definitions and reference resolution.
//!
//! Resolution is a read-only depth-first walk: object properties in
//! declaration order, union alternatives in declaration order. The first
//! missing or cyclic name hit in that order is the one reported.
//!
//! Every name is resolved at most once per call; later references to it
//! share the first result, which keeps diamond-shaped definitions linear.
//!
//! Caveat: a resolved tree is a copy. Replacing an entry with
//! [`SchemaRegistry::register`] does not update trees resolved earlier; use
//! [`SchemaRegistry::check_fresh`] to detect that.
//!
//! Not internally synchronized. Concurrent `resolve` calls are fine as long
//! as nobody is calling `register` at the same time.
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::node::SchemaNode;
use crate::resolved::{ResolvedNode, ResolvedProperty, ResolvedReference};

#[derive(Debug, Clone)]
struct Entry {
    node: SchemaNode,
    revision: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: HashMap<String, Entry>,
    revision: u64,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `node` under `name`, returning the entry it replaced.
    pub fn register(&mut self, name: impl Into<String>, node: SchemaNode) -> Option<SchemaNode> {
        self.revision += 1;
        let entry = Entry { node, revision: self.revision };
        self.entries.insert(name.into(), entry).map(|old| old.node)
    }

    pub fn remove(&mut self, name: &str) -> Option<SchemaNode> {
        self.entries.remove(name).map(|old| old.node)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.entries.get(name).map(|entry| &entry.node)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves a copy of `root`; neither the registry nor `root` is touched.
    pub fn resolve(&self, root: &SchemaNode) -> Result<ResolvedNode> {
        let mut resolution = Resolution { registry: self, chain: Vec::new(), done: HashMap::new() };
        resolution.resolve_node(root)
    }

    /// Resolves `Reference(name)`, so cycle paths start at `name`.
    pub fn resolve_named(&self, name: &str) -> Result<ResolvedNode> {
        let root = SchemaNode::reference(name)?;
        self.resolve(&root)
    }

    /// Fails if any reference in `resolved` points at an entry replaced or removed since.
    pub fn check_fresh(&self, resolved: &ResolvedNode) -> Result<()> {
        for reference in resolved.references() {
            match self.entries.get(&reference.name) {
                Some(entry) if entry.revision == reference.revision => {}
                _ => return Err(SchemaError::StaleReference(reference.name.clone())),
            }
        }
        Ok(())
    }
}

/// State for one `resolve` call.
struct Resolution<'r> {
    registry: &'r SchemaRegistry,
    /// Names on the current path, for cycle detection.
    chain: Vec<String>,
    /// Names already resolved during this call.
    done: HashMap<String, Arc<ResolvedNode>>,
}

impl Resolution<'_> {
    fn resolve_node(&mut self, node: &SchemaNode) -> Result<ResolvedNode> {
        match node {
            SchemaNode::Primitive { kind, guides } => {
                Ok(ResolvedNode::Primitive { kind: *kind, guides: guides.clone() })
            }
            SchemaNode::Array { element, guides } => Ok(ResolvedNode::Array {
                element: Box::new(self.resolve_node(element)?),
                guides: guides.clone(),
            }),
            SchemaNode::Enum { values, guides } => {
                Ok(ResolvedNode::Enum { values: values.clone(), guides: guides.clone() })
            }
            SchemaNode::Object { description, properties, guides } => {
                let mut resolved = indexmap::IndexMap::with_capacity(properties.len());
                for (name, property) in properties {
                    let node = self.resolve_node(&property.node)?;
                    resolved.insert(name.clone(), ResolvedProperty {
                        node,
                        required: property.required,
                        description: property.description.clone(),
                    });
                }
                Ok(ResolvedNode::Object {
                    description: description.clone(),
                    properties: resolved,
                    guides: guides.clone(),
                })
            }
            SchemaNode::Union { alternatives, guides } => {
                let alternatives = alternatives
                    .iter()
                    .map(|alternative| self.resolve_node(alternative))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ResolvedNode::Union { alternatives, guides: guides.clone() })
            }
            SchemaNode::Reference { name } => {
                if self.chain.contains(name) {
                    let mut path = self.chain.clone();
                    path.push(name.clone());
                    return Err(SchemaError::CyclicReference(path));
                }
                let registry = self.registry;
                let entry = registry
                    .entries
                    .get(name)
                    .ok_or_else(|| SchemaError::UnresolvedReference(name.clone()))?;
                self.chain.push(name.clone());
                let reached = self.chain.clone();
                let target = match self.done.get(name).cloned() {
                    Some(shared) => Ok(shared),
                    None => self.resolve_node(&entry.node).map(Arc::new),
                };
                self.chain.pop();
                let target = target?;
                self.done.insert(name.clone(), Arc::clone(&target));
                Ok(ResolvedNode::Reference(ResolvedReference {
                    name: name.clone(),
                    chain: reached,
                    revision: entry.revision,
                    target,
                }))
            }
        }
    }
}
