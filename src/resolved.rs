//! The resolved representation: no dangling names, no cycles.
//!
//! Kept as its own type so decoding and validation can only ever run on a
//! tree that went through [`crate::SchemaRegistry::resolve`].
//!
//! Each registry name is resolved once per `resolve` call and the result is
//! shared between every reference to it, so a tree's size stays bounded by
//! the schema that produced it. Walks that must stay linear (staleness
//! checks, validation) visit a shared target once.
use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::guide::Guide;
use crate::node::{NodeKind, PrimitiveKind, Property, SchemaNode};

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedNode {
    Primitive {
        kind: PrimitiveKind,
        guides: Vec<Guide>,
    },
    Array {
        element: Box<ResolvedNode>,
        guides: Vec<Guide>,
    },
    Enum {
        values: Vec<String>,
        guides: Vec<Guide>,
    },
    Object {
        description: Option<String>,
        properties: IndexMap<String, ResolvedProperty>,
        guides: Vec<Guide>,
    },
    Reference(ResolvedReference),
    Union {
        alternatives: Vec<ResolvedNode>,
        guides: Vec<Guide>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProperty {
    pub node: ResolvedNode,
    pub required: bool,
    pub description: Option<String>,
}

/// A reference together with the subtree it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    pub name: String,
    /// Reference names followed from the root to here, this one last.
    ///
    /// References nested inside a shared target keep the chain of the path
    /// that resolved that target first.
    pub chain: Vec<String>,
    /// Registry revision of the entry this resolved against.
    pub revision: u64,
    pub target: Arc<ResolvedNode>,
}

impl ResolvedReference {
    /// Identity of the shared target, for walks that visit each one once.
    pub(crate) fn target_id(&self) -> *const ResolvedNode {
        Arc::as_ptr(&self.target)
    }
}

impl ResolvedNode {
    /// Follows references down to the first concrete node.
    pub fn peel(&self) -> &ResolvedNode {
        let mut node = self;
        while let ResolvedNode::Reference(reference) = node {
            node = reference.target.as_ref();
        }
        node
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            ResolvedNode::Primitive { kind, .. } => NodeKind::Primitive(*kind),
            ResolvedNode::Array { .. } => NodeKind::Array,
            ResolvedNode::Enum { .. } => NodeKind::Enum,
            ResolvedNode::Object { .. } => NodeKind::Object,
            ResolvedNode::Reference(_) => NodeKind::Reference,
            ResolvedNode::Union { .. } => NodeKind::Union,
        }
    }

    pub fn guides(&self) -> &[Guide] {
        match self {
            ResolvedNode::Reference(_) => &[],
            ResolvedNode::Primitive { guides, .. }
            | ResolvedNode::Array { guides, .. }
            | ResolvedNode::Enum { guides, .. }
            | ResolvedNode::Object { guides, .. }
            | ResolvedNode::Union { guides, .. } => guides,
        }
    }

    /// Back to the unresolved form; references become named placeholders again.
    pub fn unresolved(&self) -> SchemaNode {
        match self {
            ResolvedNode::Primitive { kind, guides } => {
                SchemaNode::Primitive { kind: *kind, guides: guides.clone() }
            }
            ResolvedNode::Array { element, guides } => SchemaNode::Array {
                element: Box::new(element.unresolved()),
                guides: guides.clone(),
            },
            ResolvedNode::Enum { values, guides } => {
                SchemaNode::Enum { values: values.clone(), guides: guides.clone() }
            }
            ResolvedNode::Object { description, properties, guides } => SchemaNode::Object {
                description: description.clone(),
                properties: properties
                    .iter()
                    .map(|(name, p)| {
                        let property = Property {
                            node: p.node.unresolved(),
                            required: p.required,
                            description: p.description.clone(),
                        };
                        (name.clone(), property)
                    })
                    .collect(),
                guides: guides.clone(),
            },
            ResolvedNode::Reference(reference) => {
                SchemaNode::Reference { name: reference.name.clone() }
            }
            ResolvedNode::Union { alternatives, guides } => SchemaNode::Union {
                alternatives: alternatives.iter().map(ResolvedNode::unresolved).collect(),
                guides: guides.clone(),
            },
        }
    }

    /// Every reference in the tree, depth-first. A shared target is
    /// descended into only the first time it is reached.
    pub fn references(&self) -> Vec<&ResolvedReference> {
        let mut out = Vec::new();
        collect_references(self, &mut HashSet::new(), &mut out);
        out
    }

    /// Equality of shape, looking through references at every level.
    ///
    /// A reference and an inline copy of its target compare equal; reference
    /// names, chains and revisions are ignored.
    pub fn same_structure(&self, other: &ResolvedNode) -> bool {
        let (a, b) = (self.peel(), other.peel());
        if std::ptr::eq(a, b) {
            return true;
        }
        match (a, b) {
            (
                ResolvedNode::Primitive { kind: k1, guides: g1 },
                ResolvedNode::Primitive { kind: k2, guides: g2 },
            ) => k1 == k2 && g1 == g2,
            (
                ResolvedNode::Array { element: e1, guides: g1 },
                ResolvedNode::Array { element: e2, guides: g2 },
            ) => g1 == g2 && e1.same_structure(e2),
            (
                ResolvedNode::Enum { values: v1, guides: g1 },
                ResolvedNode::Enum { values: v2, guides: g2 },
            ) => v1 == v2 && g1 == g2,
            (
                ResolvedNode::Object { description: d1, properties: p1, guides: g1 },
                ResolvedNode::Object { description: d2, properties: p2, guides: g2 },
            ) => {
                d1 == d2
                    && g1 == g2
                    && p1.len() == p2.len()
                    && p1.iter().zip(p2).all(|((n1, a), (n2, b))| {
                        n1 == n2
                            && a.required == b.required
                            && a.description == b.description
                            && a.node.same_structure(&b.node)
                    })
            }
            (
                ResolvedNode::Union { alternatives: a1, guides: g1 },
                ResolvedNode::Union { alternatives: a2, guides: g2 },
            ) => {
                g1 == g2
                    && a1.len() == a2.len()
                    && a1.iter().zip(a2).all(|(a, b)| a.same_structure(b))
            }
            _ => false,
        }
    }
}

fn collect_references<'a>(
    node: &'a ResolvedNode,
    seen: &mut HashSet<*const ResolvedNode>,
    out: &mut Vec<&'a ResolvedReference>,
) {
    match node {
        ResolvedNode::Primitive { .. } | ResolvedNode::Enum { .. } => {}
        ResolvedNode::Array { element, .. } => collect_references(element, seen, out),
        ResolvedNode::Object { properties, .. } => {
            for property in properties.values() {
                collect_references(&property.node, seen, out);
            }
        }
        ResolvedNode::Reference(reference) => {
            out.push(reference);
            if seen.insert(reference.target_id()) {
                collect_references(&reference.target, seen, out);
            }
        }
        ResolvedNode::Union { alternatives, .. } => {
            for alternative in alternatives {
                collect_references(alternative, seen, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;

    #[test]
    fn reference_and_inline_copy_share_structure() {
        let city = || SchemaNode::object().required("city", SchemaNode::string()).build().unwrap();
        let mut registry = SchemaRegistry::new();
        registry.register("Address", city());

        let by_name = registry.resolve_named("Address").unwrap();
        let inline = registry.resolve(&city()).unwrap();
        assert_ne!(by_name, inline);
        assert!(by_name.same_structure(&inline));
        assert!(inline.same_structure(&by_name));

        let other = registry
            .resolve(&SchemaNode::object().optional("city", SchemaNode::string()).build().unwrap())
            .unwrap();
        assert!(!by_name.same_structure(&other));
    }
}
