//! Runtime schema nodes and their builders.
//!
//! Builders check only local shape (enum values, property names, union
//! arity). Reference targets and guide/type compatibility are left to
//! [`crate::registry`] and [`crate::validate`], so nodes can be built in any
//! order, forward references included.
use std::fmt;

use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::error::{Result, Rule};
use crate::guide::Guide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

/// Node kind tag, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Primitive(PrimitiveKind),
    Array,
    Enum,
    Object,
    Reference,
    Union,
}

/// An unresolved schema tree. May contain [`SchemaNode::Reference`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Primitive {
        kind: PrimitiveKind,
        guides: Vec<Guide>,
    },
    Array {
        element: Box<SchemaNode>,
        guides: Vec<Guide>,
    },
    Enum {
        values: Vec<String>,
        guides: Vec<Guide>,
    },
    Object {
        description: Option<String>,
        properties: IndexMap<String, Property>,
        guides: Vec<Guide>,
    },
    Reference {
        name: String,
    },
    Union {
        alternatives: Vec<SchemaNode>,
        guides: Vec<Guide>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub node: SchemaNode,
    pub required: bool,
    pub description: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDERS
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        SchemaNode::Primitive { kind, guides: Vec::new() }
    }
    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }
    pub fn integer() -> Self {
        Self::primitive(PrimitiveKind::Integer)
    }
    pub fn number() -> Self {
        Self::primitive(PrimitiveKind::Number)
    }
    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }

    pub fn array(element: SchemaNode) -> Self {
        SchemaNode::Array { element: Box::new(element), guides: Vec::new() }
    }

    pub fn enum_of<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = IndexSet::new();
        for value in values {
            let value = value.into();
            if value.is_empty() {
                return Err(Rule::EmptyEnumValue.into());
            }
            if seen.contains(&value) {
                return Err(Rule::DuplicateEnumValue(value).into());
            }
            seen.insert(value);
        }
        if seen.is_empty() {
            return Err(Rule::EmptyEnum.into());
        }
        Ok(SchemaNode::Enum { values: seen.into_iter().collect(), guides: Vec::new() })
    }

    pub fn object() -> ObjectBuilder {
        ObjectBuilder::default()
    }

    pub fn reference(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Rule::EmptyReferenceName.into());
        }
        Ok(SchemaNode::Reference { name })
    }

    pub fn union(alternatives: Vec<SchemaNode>) -> Result<Self> {
        if alternatives.len() < 2 {
            return Err(Rule::TooFewUnionAlternatives(alternatives.len()).into());
        }
        Ok(SchemaNode::Union { alternatives, guides: Vec::new() })
    }

    /// Attach a guide. Compatibility with the node kind is checked at validation.
    pub fn with_guide(mut self, guide: Guide) -> Result<Self> {
        match &mut self {
            SchemaNode::Reference { .. } => return Err(Rule::GuideOnReference.into()),
            SchemaNode::Primitive { guides, .. }
            | SchemaNode::Array { guides, .. }
            | SchemaNode::Enum { guides, .. }
            | SchemaNode::Object { guides, .. }
            | SchemaNode::Union { guides, .. } => guides.push(guide),
        }
        Ok(self)
    }

    pub fn with_guides(self, guides: impl IntoIterator<Item = Guide>) -> Result<Self> {
        guides.into_iter().try_fold(self, |node, guide| node.with_guide(guide))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            SchemaNode::Primitive { kind, .. } => NodeKind::Primitive(*kind),
            SchemaNode::Array { .. } => NodeKind::Array,
            SchemaNode::Enum { .. } => NodeKind::Enum,
            SchemaNode::Object { .. } => NodeKind::Object,
            SchemaNode::Reference { .. } => NodeKind::Reference,
            SchemaNode::Union { .. } => NodeKind::Union,
        }
    }

    pub fn guides(&self) -> &[Guide] {
        match self {
            SchemaNode::Reference { .. } => &[],
            SchemaNode::Primitive { guides, .. }
            | SchemaNode::Array { guides, .. }
            | SchemaNode::Enum { guides, .. }
            | SchemaNode::Object { guides, .. }
            | SchemaNode::Union { guides, .. } => guides,
        }
    }
}

/// Collects properties in declaration order; duplicate names fail at [`ObjectBuilder::build`].
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    description: Option<String>,
    properties: Vec<(String, Property)>,
}

impl ObjectBuilder {
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
    pub fn required(self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.property(name, Property { node, required: true, description: None })
    }
    pub fn optional(self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.property(name, Property { node, required: false, description: None })
    }
    pub fn property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.push((name.into(), property));
        self
    }
    /// Sets the description of the most recently added property.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        if let Some((_, last)) = self.properties.last_mut() {
            last.description = Some(text.into());
        }
        self
    }
    pub fn build(self) -> Result<SchemaNode> {
        let mut properties = IndexMap::with_capacity(self.properties.len());
        for (name, property) in self.properties {
            if name.is_empty() {
                return Err(Rule::EmptyPropertyName.into());
            }
            if properties.contains_key(&name) {
                return Err(Rule::DuplicatePropertyName(name).into());
            }
            properties.insert(name, property);
        }
        Ok(SchemaNode::Object { description: self.description, properties, guides: Vec::new() })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DISPLAY
// ————————————————————————————————————————————————————————————————————————————

impl PrimitiveKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveKind::Integer | PrimitiveKind::Number)
    }
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PrimitiveKind::String),
            "integer" => Some(PrimitiveKind::Integer),
            "number" => Some(PrimitiveKind::Number),
            "boolean" => Some(PrimitiveKind::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Primitive(kind) => write!(f, "{kind}"),
            NodeKind::Array => f.write_str("array"),
            NodeKind::Enum => f.write_str("enum"),
            NodeKind::Object => f.write_str("object"),
            NodeKind::Reference => f.write_str("reference"),
            NodeKind::Union => f.write_str("union"),
        }
    }
}

impl serde::Serialize for NodeKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;

    #[test]
    fn duplicate_property_names_fail_at_build() {
        let result = SchemaNode::object()
            .required("name", SchemaNode::string())
            .optional("name", SchemaNode::integer())
            .build();
        assert_eq!(
            result,
            Err(SchemaError::MalformedSchema(Rule::DuplicatePropertyName("name".into())))
        );
    }

    #[test]
    fn enum_rules() {
        assert_eq!(
            SchemaNode::enum_of(Vec::<String>::new()),
            Err(SchemaError::MalformedSchema(Rule::EmptyEnum))
        );
        assert_eq!(
            SchemaNode::enum_of(["cat", "dog", "cat"]),
            Err(SchemaError::MalformedSchema(Rule::DuplicateEnumValue("cat".into())))
        );
        assert_eq!(
            SchemaNode::enum_of(["cat", ""]),
            Err(SchemaError::MalformedSchema(Rule::EmptyEnumValue))
        );
        assert!(SchemaNode::enum_of(["cat", "Cat"]).is_ok());
    }

    #[test]
    fn union_needs_two_alternatives() {
        assert_eq!(
            SchemaNode::union(vec![SchemaNode::string()]),
            Err(SchemaError::MalformedSchema(Rule::TooFewUnionAlternatives(1)))
        );
        assert!(SchemaNode::union(vec![SchemaNode::string(), SchemaNode::number()]).is_ok());
    }

    #[test]
    fn references_reject_guides_and_empty_names() {
        assert_eq!(
            SchemaNode::reference(""),
            Err(SchemaError::MalformedSchema(Rule::EmptyReferenceName))
        );
        let guide = Guide::count(0, 3).unwrap();
        assert_eq!(
            SchemaNode::reference("Address").unwrap().with_guide(guide),
            Err(SchemaError::MalformedSchema(Rule::GuideOnReference))
        );
    }

    #[test]
    fn property_order_is_declaration_order() {
        let node = SchemaNode::object()
            .required("zeta", SchemaNode::string())
            .describe("last letter")
            .optional("alpha", SchemaNode::boolean())
            .build()
            .unwrap();
        let SchemaNode::Object { properties, .. } = node else { unreachable!() };
        let names: Vec<&str> = properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(properties["zeta"].description.as_deref(), Some("last letter"));
    }
}
