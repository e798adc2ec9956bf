//! JSON-Schema style interchange for schema nodes.
//!
//! A host-level format layered on top of [`SchemaNode`]; the core itself
//! never reads or writes it. Supported keywords: `type`, `properties`,
//! `required`, `description`, `items`, `enum`, `anyOf`, `$ref`
//! (`#/$defs/<name>`), `$defs`, plus guide keywords `minimum`/`maximum`,
//! `pattern`, `minItems`/`maxItems` and `x-choices`.
//!
//! - `enum` without `type` or `anyOf` is an enum node; anywhere else it is a
//!   `choices` guide. `x-choices` carries choices on enum nodes.
//! - Guide keywords are read whatever the `type`, so incompatible pairs still
//!   reach the validator. Next to `$ref` they are rejected.
//! - One JSON object cannot hold the same keyword twice, so duplicate guide
//!   kinds do not survive emission (the last one wins).
//! - A property's description and an object node's own description share the
//!   `description` keyword; on object-valued properties the node's wins.
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::error::{Rule, SchemaError};
use crate::guide::{Guide, Literal};
use crate::node::{PrimitiveKind, Property, SchemaNode};
use crate::path::Path;
use crate::registry::SchemaRegistry;

const REF_PREFIX: &str = "#/$defs/";

const GUIDE_KEYWORDS: [&str; 7] =
    ["minimum", "maximum", "pattern", "minItems", "maxItems", "enum", "x-choices"];

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("at {path}: {message}")]
    Invalid { path: Path, message: String },
    #[error("at {path}: {source}")]
    Schema {
        path: Path,
        #[source]
        source: SchemaError,
    },
}

/// A parsed document: the root node and its named definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub root: SchemaNode,
    pub definitions: IndexMap<String, SchemaNode>,
}

impl SchemaDocument {
    /// Registers every definition in a fresh registry.
    pub fn into_parts(self) -> (SchemaRegistry, SchemaNode) {
        let mut registry = SchemaRegistry::new();
        for (name, node) in self.definitions {
            registry.register(name, node);
        }
        (registry, self.root)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EMIT
// ————————————————————————————————————————————————————————————————————————————

pub fn to_json_schema(node: &SchemaNode) -> Value {
    let mut out = match node {
        SchemaNode::Primitive { kind, .. } => json!({ "type": kind.as_str() }),
        SchemaNode::Array { element, .. } => json!({
            "type": "array",
            "items": to_json_schema(element),
        }),
        SchemaNode::Enum { values, .. } => json!({ "enum": values }),
        SchemaNode::Object { description, properties, .. } => {
            let mut props = Map::new();
            for (name, property) in properties {
                let mut child = to_json_schema(&property.node);
                if let (Some(text), Value::Object(map)) = (&property.description, &mut child) {
                    map.entry("description").or_insert_with(|| Value::from(text.as_str()));
                }
                props.insert(name.clone(), child);
            }
            let required: Vec<&str> = properties
                .iter()
                .filter(|(_, p)| p.required)
                .map(|(name, _)| name.as_str())
                .collect();
            let mut o = json!({ "type": "object", "properties": props });
            if !required.is_empty() {
                o["required"] = json!(required);
            }
            if let Some(text) = description {
                o["description"] = Value::from(text.as_str());
            }
            o
        }
        SchemaNode::Reference { name } => json!({ "$ref": format!("{REF_PREFIX}{name}") }),
        SchemaNode::Union { alternatives, .. } => json!({
            "anyOf": alternatives.iter().map(to_json_schema).collect::<Vec<_>>(),
        }),
    };

    let enum_node = matches!(node, SchemaNode::Enum { .. });
    if let Value::Object(map) = &mut out {
        for guide in node.guides() {
            match guide {
                Guide::Choices(_) if enum_node => {
                    let mut keywords = guide.keywords();
                    if let Some(values) = keywords.remove("enum") {
                        map.insert("x-choices".into(), values);
                    }
                }
                _ => map.extend(guide.keywords()),
            }
        }
    }
    out
}

/// Root schema plus every registry entry under `$defs`, names sorted.
pub fn document(registry: &SchemaRegistry, root: &SchemaNode) -> Value {
    let mut out = to_json_schema(root);
    if !registry.is_empty() {
        let mut defs = Map::new();
        for name in registry.names() {
            if let Some(node) = registry.get(name) {
                defs.insert(name.to_string(), to_json_schema(node));
            }
        }
        if let Value::Object(map) = &mut out {
            map.insert("$defs".into(), Value::Object(defs));
        }
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// PARSE
// ————————————————————————————————————————————————————————————————————————————

pub fn from_json_schema(value: &Value) -> Result<SchemaDocument, InterchangeError> {
    let root_path = Path::root();
    let root = parse_node(value, &root_path)?;
    let mut definitions = IndexMap::new();
    if let Some(defs) = value.get("$defs") {
        let defs_path = root_path.field("$defs");
        let Value::Object(defs) = defs else {
            return Err(invalid(&defs_path, "`$defs` must be an object"));
        };
        for (name, def) in defs {
            definitions.insert(name.clone(), parse_node(def, &defs_path.field(name))?);
        }
    }
    Ok(SchemaDocument { root, definitions })
}

fn parse_node(value: &Value, path: &Path) -> Result<SchemaNode, InterchangeError> {
    let Value::Object(map) = value else {
        return Err(invalid(path, "schema must be an object"));
    };
    let schema_err = |source: SchemaError| InterchangeError::Schema { path: path.clone(), source };

    if let Some(target) = map.get("$ref") {
        if GUIDE_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)) {
            return Err(schema_err(Rule::GuideOnReference.into()));
        }
        let name = target
            .as_str()
            .and_then(|s| s.strip_prefix(REF_PREFIX))
            .ok_or_else(|| invalid(path, format!("`$ref` must look like `{REF_PREFIX}<name>`")))?;
        return SchemaNode::reference(name).map_err(schema_err);
    }

    let node = if let Some(alternatives) = map.get("anyOf") {
        let Value::Array(alternatives) = alternatives else {
            return Err(invalid(path, "`anyOf` must be an array"));
        };
        let alternatives = alternatives
            .iter()
            .enumerate()
            .map(|(i, alt)| parse_node(alt, &path.alternative(i)))
            .collect::<Result<Vec<_>, _>>()?;
        SchemaNode::union(alternatives).map_err(schema_err)?
    } else {
        match map.get("type") {
            None => {
                let Some(values) = map.get("enum") else {
                    return Err(invalid(path, "missing `type`, `enum`, `anyOf` or `$ref`"));
                };
                let values = string_list(values, path, "enum")?;
                SchemaNode::enum_of(values).map_err(schema_err)?
            }
            Some(Value::String(t)) if t == "object" => parse_object(map, path)?,
            Some(Value::String(t)) if t == "array" => {
                let items = map
                    .get("items")
                    .ok_or_else(|| invalid(path, "array schema needs `items`"))?;
                SchemaNode::array(parse_node(items, &path.element())?)
            }
            Some(other) => match other.as_str().and_then(PrimitiveKind::from_name) {
                Some(kind) => SchemaNode::primitive(kind),
                None => return Err(invalid(path, format!("unsupported type {other}"))),
            },
        }
    };

    let mut guides = parse_guides(map, path)?;
    // on an enum node `enum` already holds the values
    if !matches!(node, SchemaNode::Enum { .. }) {
        if let Some(literals) = map.get("enum") {
            guides.push(parse_choices(literals, path)?);
        }
    }
    if let Some(literals) = map.get("x-choices") {
        guides.push(parse_choices(literals, path)?);
    }
    node.with_guides(guides).map_err(schema_err)
}

fn parse_object(map: &Map<String, Value>, path: &Path) -> Result<SchemaNode, InterchangeError> {
    let required = match map.get("required") {
        Some(list) => string_list(list, path, "required")?,
        None => Vec::new(),
    };
    let empty = Map::new();
    let properties = match map.get("properties") {
        Some(Value::Object(props)) => props,
        Some(_) => return Err(invalid(path, "`properties` must be an object")),
        None => &empty,
    };
    if let Some(unknown) = required.iter().find(|name| !properties.contains_key(*name)) {
        return Err(invalid(path, format!("required property `{unknown}` is not declared")));
    }

    let mut builder = SchemaNode::object();
    if let Some(text) = map.get("description").and_then(Value::as_str) {
        builder = builder.description(text);
    }
    for (name, schema) in properties {
        let node = parse_node(schema, &path.field(name))?;
        let description = match node {
            SchemaNode::Object { .. } => None,
            _ => schema.get("description").and_then(Value::as_str).map(str::to_string),
        };
        let property = Property { node, required: required.contains(name), description };
        builder = builder.property(name.clone(), property);
    }
    builder
        .build()
        .map_err(|source| InterchangeError::Schema { path: path.clone(), source })
}

fn parse_guides(map: &Map<String, Value>, path: &Path) -> Result<Vec<Guide>, InterchangeError> {
    let schema_err = |source: SchemaError| InterchangeError::Schema { path: path.clone(), source };
    let mut guides = Vec::new();

    let minimum = number_keyword(map, "minimum", path)?;
    let maximum = number_keyword(map, "maximum", path)?;
    if minimum.is_some() || maximum.is_some() {
        guides.push(Guide::range_bounds(minimum, maximum).map_err(schema_err)?);
    }
    if let Some(pattern) = map.get("pattern") {
        let source = pattern.as_str().ok_or_else(|| invalid(path, "`pattern` must be a string"))?;
        guides.push(Guide::pattern(source).map_err(schema_err)?);
    }
    let min_items = integer_keyword(map, "minItems", path)?;
    let max_items = integer_keyword(map, "maxItems", path)?;
    if min_items.is_some() || max_items.is_some() {
        guides.push(Guide::count_bounds(min_items, max_items).map_err(schema_err)?);
    }
    Ok(guides)
}

fn parse_choices(literals: &Value, path: &Path) -> Result<Guide, InterchangeError> {
    let Value::Array(items) = literals else {
        return Err(invalid(path, "choices must be an array"));
    };
    let literals = items
        .iter()
        .map(|item| Literal::from_value(item).ok_or_else(|| invalid(path, "choices must be scalars")))
        .collect::<Result<Vec<_>, _>>()?;
    Guide::choices(literals).map_err(|source| InterchangeError::Schema { path: path.clone(), source })
}

fn number_keyword(map: &Map<String, Value>, key: &str, path: &Path) -> Result<Option<f64>, InterchangeError> {
    map.get(key)
        .map(|v| v.as_f64().ok_or_else(|| invalid(path, format!("`{key}` must be a number"))))
        .transpose()
}

fn integer_keyword(map: &Map<String, Value>, key: &str, path: &Path) -> Result<Option<i64>, InterchangeError> {
    map.get(key)
        .map(|v| v.as_i64().ok_or_else(|| invalid(path, format!("`{key}` must be an integer"))))
        .transpose()
}

fn string_list(value: &Value, path: &Path, key: &str) -> Result<Vec<String>, InterchangeError> {
    let Value::Array(items) = value else {
        return Err(invalid(path, format!("`{key}` must be an array of strings")));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(path, format!("`{key}` must be an array of strings")))
        })
        .collect()
}

fn invalid(path: &Path, message: impl Into<String>) -> InterchangeError {
    InterchangeError::Invalid { path: path.clone(), message: message.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guide::GuideKind;
    use crate::node::NodeKind;
    use crate::validate::{FindingKind, validate};

    #[test]
    fn parses_defs_refs_and_guides() {
        let doc = json!({
            "type": "object",
            "properties": {
                "sku": { "type": "string", "pattern": "[A-Z]{3}-\\d{4}" },
                "qty": { "type": "integer", "minimum": 1, "description": "units" },
                "ship_to": { "$ref": "#/$defs/Address" }
            },
            "required": ["sku", "qty"],
            "$defs": {
                "Address": {
                    "type": "object",
                    "properties": { "city": { "type": "string" } },
                    "required": ["city"]
                }
            }
        });
        let parsed = from_json_schema(&doc).unwrap();
        let (registry, root) = parsed.into_parts();
        assert!(registry.contains("Address"));

        let SchemaNode::Object { properties, .. } = &root else { panic!("expected object") };
        assert!(properties["sku"].required);
        assert!(!properties["ship_to"].required);
        assert_eq!(properties["qty"].description.as_deref(), Some("units"));
        assert_eq!(properties["qty"].node.guides(), &[Guide::minimum(1.0).unwrap()]);
        assert!(registry.resolve(&root).is_ok());
    }

    #[test]
    fn enum_with_and_without_type() {
        let parsed = from_json_schema(&json!({ "enum": ["cat", "dog"] })).unwrap();
        assert_eq!(parsed.root, SchemaNode::enum_of(["cat", "dog"]).unwrap());

        let parsed = from_json_schema(&json!({ "type": "integer", "enum": [1, 2] })).unwrap();
        assert_eq!(
            parsed.root,
            SchemaNode::integer()
                .with_guide(Guide::choices([Literal::from(1_i64), Literal::from(2_i64)]).unwrap())
                .unwrap()
        );
    }

    #[test]
    fn builder_rules_still_fail_fast() {
        let err = from_json_schema(&json!({ "anyOf": [{ "type": "string" }] })).unwrap_err();
        assert!(matches!(
            err,
            InterchangeError::Schema { source: SchemaError::MalformedSchema(Rule::TooFewUnionAlternatives(1)), .. }
        ));

        let err = from_json_schema(&json!({
            "type": "object",
            "properties": { "tags": { "type": "array", "items": { "type": "string" }, "minItems": 5, "maxItems": 2 } }
        }))
        .unwrap_err();
        let InterchangeError::Schema { path, .. } = err else { panic!("expected guide error") };
        assert_eq!(path.to_string(), "$.tags");
    }

    #[test]
    fn emitted_documents_parse_back() {
        let mut registry = SchemaRegistry::new();
        registry.register("Tag", SchemaNode::enum_of(["a", "b"]).unwrap());
        let root = SchemaNode::object()
            .description("a post")
            .required("title", SchemaNode::string().with_guide(Guide::pattern(".+").unwrap()).unwrap())
            .describe("headline")
            .optional(
                "tags",
                SchemaNode::array(SchemaNode::reference("Tag").unwrap())
                    .with_guide(Guide::count(0, 5).unwrap())
                    .unwrap(),
            )
            .required(
                "score",
                SchemaNode::union(vec![SchemaNode::integer(), SchemaNode::boolean()]).unwrap(),
            )
            .build()
            .unwrap();

        let parsed = from_json_schema(&document(&registry, &root)).unwrap();
        assert_eq!(parsed.root, root);
        assert_eq!(parsed.definitions["Tag"], SchemaNode::enum_of(["a", "b"]).unwrap());
    }

    #[test]
    fn choices_on_non_primitives_use_extension_keyword() {
        let node = SchemaNode::enum_of(["a", "b"])
            .unwrap()
            .with_guide(Guide::choices(["a"]).unwrap())
            .unwrap();
        let emitted = to_json_schema(&node);
        assert_eq!(emitted, json!({ "enum": ["a", "b"], "x-choices": ["a"] }));
        assert_eq!(from_json_schema(&emitted).unwrap().root, node);
    }

    #[test]
    fn enum_beside_structured_types_becomes_choices() {
        let array = from_json_schema(&json!({
            "type": "array",
            "items": { "type": "integer" },
            "enum": [1, 2]
        }))
        .unwrap()
        .root;
        assert_eq!(
            array.guides(),
            &[Guide::choices([Literal::from(1_i64), Literal::from(2_i64)]).unwrap()]
        );
        let report = validate(&SchemaRegistry::new().resolve(&array).unwrap());
        assert_eq!(
            report.findings[0].kind,
            FindingKind::IncompatibleGuide { guide: GuideKind::Choices, node: NodeKind::Array }
        );

        let union = from_json_schema(&json!({
            "anyOf": [{ "type": "string" }, { "type": "boolean" }],
            "enum": ["x"]
        }))
        .unwrap()
        .root;
        assert_eq!(union.guides(), &[Guide::choices(["x"]).unwrap()]);
        let report = validate(&SchemaRegistry::new().resolve(&union).unwrap());
        assert_eq!(
            report.findings[0].kind,
            FindingKind::IncompatibleGuide { guide: GuideKind::Choices, node: NodeKind::Union }
        );
    }

    #[test]
    fn guide_keywords_beside_ref_are_rejected() {
        let err = from_json_schema(&json!({
            "type": "object",
            "properties": { "a": { "$ref": "#/$defs/A", "minimum": 3 } },
            "$defs": { "A": { "type": "integer" } }
        }))
        .unwrap_err();
        let InterchangeError::Schema { path, source } = err else { panic!("expected schema error") };
        assert_eq!(path.to_string(), "$.a");
        assert_eq!(source, SchemaError::MalformedSchema(Rule::GuideOnReference));
    }

    #[test]
    fn choices_on_structured_nodes_round_trip() {
        let node = SchemaNode::array(SchemaNode::string())
            .with_guide(Guide::choices(["a"]).unwrap())
            .unwrap();
        let emitted = to_json_schema(&node);
        assert_eq!(emitted["enum"], json!(["a"]));
        assert_eq!(from_json_schema(&emitted).unwrap().root, node);
    }
}
