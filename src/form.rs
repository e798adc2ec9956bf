//! Flattens a resolved schema into input-field descriptors for a form layer.
//!
//! Nothing here renders, decodes or validates.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::guide::{Guide, Literal};
use crate::node::PrimitiveKind;
use crate::path::Path;
use crate::resolved::ResolvedNode;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Integer,
    Number,
    Toggle,
    Picker(Vec<String>),
    List(Box<InputKind>),
    /// Union field; the form layer decides how to offer the alternatives.
    Alternatives(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Dotted property path (`customer.address.city`); empty for a scalar root.
    pub path: String,
    pub label: String,
    pub input: InputKind,
    /// True only when every property along the path is required.
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub guides: Vec<Guide>,
}

pub fn describe_form(root: &ResolvedNode) -> Vec<FieldDescriptor> {
    let mut out = Vec::new();
    flatten(root, &Path::root(), true, None, &mut out);
    out
}

fn flatten(
    node: &ResolvedNode,
    path: &Path,
    required: bool,
    description: Option<&str>,
    out: &mut Vec<FieldDescriptor>,
) {
    let node = node.peel();
    if let ResolvedNode::Object { properties, .. } = node {
        for (name, property) in properties {
            flatten(
                &property.node,
                &path.field(name),
                required && property.required,
                property.description.as_deref(),
                out,
            );
        }
        return;
    }
    let label = path.field_names().last().map(|name| humanize(name)).unwrap_or_else(|| "Value".into());
    out.push(FieldDescriptor {
        path: path.dotted(),
        label,
        input: input_kind(node),
        required,
        description: description.map(str::to_string),
        guides: node.guides().to_vec(),
    });
}

fn input_kind(node: &ResolvedNode) -> InputKind {
    match node.peel() {
        ResolvedNode::Primitive { kind, guides } => {
            let choices = guides.iter().find_map(|g| match g {
                Guide::Choices(set) => Some(set.iter().map(literal_label).collect()),
                _ => None,
            });
            match (choices, kind) {
                (Some(options), _) => InputKind::Picker(options),
                (None, PrimitiveKind::String) => InputKind::Text,
                (None, PrimitiveKind::Integer) => InputKind::Integer,
                (None, PrimitiveKind::Number) => InputKind::Number,
                (None, PrimitiveKind::Boolean) => InputKind::Toggle,
            }
        }
        ResolvedNode::Enum { values, .. } => InputKind::Picker(values.clone()),
        ResolvedNode::Array { element, .. } => InputKind::List(Box::new(input_kind(element))),
        ResolvedNode::Union { alternatives, .. } => InputKind::Alternatives(alternatives.len()),
        // nested objects inside lists are edited as text blobs
        ResolvedNode::Object { .. } | ResolvedNode::Reference(_) => InputKind::Text,
    }
}

fn literal_label(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => s.clone(),
        other => other.to_string(),
    }
}

static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));

/// `lineItems` / `line_items` / `line-items` → `Line Items`.
fn humanize(name: &str) -> String {
    let spaced = WORD_BOUNDARY.replace_all(name, "$1 $2");
    spaced
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SchemaNode;
    use crate::registry::SchemaRegistry;

    #[test]
    fn labels_are_humanized() {
        assert_eq!(humanize("lineItems"), "Line Items");
        assert_eq!(humanize("line_items"), "Line Items");
        assert_eq!(humanize("zip-code"), "Zip Code");
        assert_eq!(humanize("id"), "Id");
    }

    #[test]
    fn objects_flatten_to_dotted_leaves() {
        let mut registry = SchemaRegistry::new();
        registry.register(
            "Address",
            SchemaNode::object()
                .required("city", SchemaNode::string())
                .optional("zipCode", SchemaNode::string())
                .build()
                .unwrap(),
        );
        let root = SchemaNode::object()
            .required(
                "size",
                SchemaNode::string().with_guide(Guide::choices(["S", "M", "L"]).unwrap()).unwrap(),
            )
            .optional("address", SchemaNode::reference("Address").unwrap())
            .describe("where to ship")
            .required("tags", SchemaNode::array(SchemaNode::enum_of(["new", "sale"]).unwrap()))
            .build()
            .unwrap();
        let fields = describe_form(&registry.resolve(&root).unwrap());

        let paths: Vec<&str> = fields.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["size", "address.city", "address.zipCode", "tags"]);
        assert_eq!(fields[0].input, InputKind::Picker(vec!["S".into(), "M".into(), "L".into()]));
        assert!(fields[0].required);
        // optional parent makes every nested leaf optional
        assert!(!fields[1].required);
        assert_eq!(fields[2].label, "Zip Code");
        assert_eq!(
            fields[3].input,
            InputKind::List(Box::new(InputKind::Picker(vec!["new".into(), "sale".into()])))
        );
    }

    #[test]
    fn scalar_root_is_a_single_field() {
        let root = SchemaRegistry::new().resolve(&SchemaNode::boolean()).unwrap();
        let fields = describe_form(&root);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].path, "");
        assert_eq!(fields[0].label, "Value");
        assert_eq!(fields[0].input, InputKind::Toggle);
    }
}
