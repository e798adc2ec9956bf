//! Type-directed decoding of generator output against a resolved schema.
//!
//! Every guide is re-checked against the actual data. Object keys the
//! schema does not declare are not checked; they ride along in
//! [`Decoded::Object`] so re-encoding gives back the same document.
//!
//! Unions are first-match: alternatives are tried in declaration order and
//! the first one that decodes wins, so callers should list the more specific
//! alternatives first.
use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::guide::Guide;
use crate::node::PrimitiveKind;
use crate::path::Path;
use crate::resolved::{ResolvedNode, ResolvedProperty};

/// Schema-shaped value produced by [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Enum(String),
    Array(Vec<Decoded>),
    /// Declared properties, plus undeclared keys carried through untouched.
    Object { fields: IndexMap<String, Decoded>, extra: Map<String, Value> },
    /// The union alternative that matched, by declaration index.
    Variant { index: usize, value: Box<Decoded> },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("at {path}: expected {expected}, found {found}{}", AlternativeList(.alternatives))]
pub struct DecodeError {
    pub path: Path,
    pub expected: String,
    pub found: String,
    /// One failure per union alternative, in declaration order.
    pub alternatives: Vec<DecodeError>,
}

// ————————————————————————————————————————————————————————————————————————————
// DECODE
// ————————————————————————————————————————————————————————————————————————————

pub fn decode(schema: &ResolvedNode, value: &Value) -> Result<Decoded, DecodeError> {
    decode_at(schema, value, &Path::root())
}

fn decode_at(schema: &ResolvedNode, value: &Value, path: &Path) -> Result<Decoded, DecodeError> {
    match schema {
        ResolvedNode::Reference(reference) => decode_at(&reference.target, value, path),
        ResolvedNode::Primitive { kind, guides } => decode_primitive(*kind, guides, value, path),
        ResolvedNode::Enum { values, .. } => match value {
            Value::String(s) if values.iter().any(|v| v == s) => Ok(Decoded::Enum(s.clone())),
            _ => Err(DecodeError::new(path, format!("one of {values:?}"), value)),
        },
        ResolvedNode::Array { element, guides } => {
            let Value::Array(items) = value else {
                return Err(DecodeError::new(path, "array", value));
            };
            let decoded = items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_at(element, item, &path.index(i)))
                .collect::<Result<Vec<_>, _>>()?;
            // element errors win over length errors
            for guide in guides {
                if !guide.admits_len(decoded.len()) {
                    return Err(DecodeError::new(path, format!("array with {guide}"), value));
                }
            }
            Ok(Decoded::Array(decoded))
        }
        ResolvedNode::Object { properties, .. } => {
            let Value::Object(map) = value else {
                return Err(DecodeError::new(path, "object", value));
            };
            decode_object(properties, map, path)
        }
        ResolvedNode::Union { alternatives, .. } => {
            let mut failures = Vec::with_capacity(alternatives.len());
            for (index, alternative) in alternatives.iter().enumerate() {
                match decode_at(alternative, value, path) {
                    Ok(decoded) => return Ok(Decoded::Variant { index, value: Box::new(decoded) }),
                    Err(error) => failures.push(error),
                }
            }
            let mut error =
                DecodeError::new(path, format!("one of {} alternatives", alternatives.len()), value);
            error.alternatives = failures;
            Err(error)
        }
    }
}

fn decode_primitive(
    kind: PrimitiveKind,
    guides: &[Guide],
    value: &Value,
    path: &Path,
) -> Result<Decoded, DecodeError> {
    let rejected = |guide: &Guide| DecodeError::new(path, format!("{kind} with {guide}"), value);
    match (kind, value) {
        (PrimitiveKind::String, Value::String(s)) => {
            match guides.iter().find(|g| !g.admits_string(s)) {
                Some(guide) => Err(rejected(guide)),
                None => Ok(Decoded::String(s.clone())),
            }
        }
        (PrimitiveKind::Boolean, Value::Bool(b)) => match guides.iter().find(|g| !g.admits_bool(*b)) {
            Some(guide) => Err(rejected(guide)),
            None => Ok(Decoded::Boolean(*b)),
        },
        (PrimitiveKind::Integer, Value::Number(n)) => {
            let Some(i) = n.as_i64() else {
                let expected = if n.is_u64() { "integer within i64" } else { "integer" };
                return Err(DecodeError::new(path, expected, value));
            };
            match guides.iter().find(|g| !g.admits_integer(i)) {
                Some(guide) => Err(rejected(guide)),
                None => Ok(Decoded::Integer(i)),
            }
        }
        (PrimitiveKind::Number, Value::Number(n)) => {
            let Some(x) = n.as_f64() else {
                return Err(DecodeError::new(path, "finite number", value));
            };
            match guides.iter().find(|g| !g.admits_number(x)) {
                Some(guide) => Err(rejected(guide)),
                None => Ok(Decoded::Number(x)),
            }
        }
        _ => Err(DecodeError::new(path, kind.as_str(), value)),
    }
}

fn decode_object(
    properties: &IndexMap<String, ResolvedProperty>,
    map: &Map<String, Value>,
    path: &Path,
) -> Result<Decoded, DecodeError> {
    let mut fields = IndexMap::with_capacity(properties.len());
    for (name, property) in properties {
        match map.get(name) {
            // optional properties treat null as absent
            None | Some(Value::Null) if !property.required => {}
            None => {
                return Err(DecodeError {
                    path: path.field(name),
                    expected: "required property".into(),
                    found: "nothing".into(),
                    alternatives: Vec::new(),
                });
            }
            Some(field) => {
                fields.insert(name.clone(), decode_at(&property.node, field, &path.field(name))?);
            }
        }
    }
    let extra = map
        .iter()
        .filter(|(key, _)| !properties.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok(Decoded::Object { fields, extra })
}

// ————————————————————————————————————————————————————————————————————————————
// DECODED VALUES
// ————————————————————————————————————————————————————————————————————————————

impl Decoded {
    /// Back to a plain JSON value; union variants are transparent.
    pub fn encode(&self) -> Value {
        match self {
            Decoded::Boolean(b) => Value::Bool(*b),
            Decoded::Integer(i) => Value::from(*i),
            Decoded::Number(x) => Value::from(*x),
            Decoded::String(s) | Decoded::Enum(s) => Value::String(s.clone()),
            Decoded::Array(items) => Value::Array(items.iter().map(Decoded::encode).collect()),
            Decoded::Object { fields, extra } => {
                let mut map: Map<String, Value> =
                    fields.iter().map(|(k, v)| (k.clone(), v.encode())).collect();
                map.extend(extra.clone());
                Value::Object(map)
            }
            Decoded::Variant { value, .. } => value.encode(),
        }
    }

    /// Looks through union variants.
    pub fn unwrap_variant(&self) -> &Decoded {
        let mut current = self;
        while let Decoded::Variant { value, .. } = current {
            current = value;
        }
        current
    }

    pub fn field(&self, name: &str) -> Option<&Decoded> {
        match self.unwrap_variant() {
            Decoded::Object { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.unwrap_variant() {
            Decoded::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.unwrap_variant() {
            Decoded::String(s) | Decoded::Enum(s) => Some(s),
            _ => None,
        }
    }
}

impl DecodeError {
    fn new(path: &Path, expected: impl Into<String>, found: &Value) -> Self {
        Self {
            path: path.clone(),
            expected: expected.into(),
            found: describe(found),
            alternatives: Vec::new(),
        }
    }
}

fn describe(value: &Value) -> String {
    const MAX_SHOWN: usize = 40;
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) if s.chars().count() > MAX_SHOWN => {
            let head: String = s.chars().take(MAX_SHOWN).collect();
            format!("string {head:?}…")
        }
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".into(),
    }
}

struct AlternativeList<'a>(&'a [DecodeError]);

impl fmt::Display for AlternativeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, failure) in self.0.iter().enumerate() {
            write!(f, "\n  alternative {index}: {failure}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SchemaNode;
    use crate::registry::SchemaRegistry;
    use serde_json::json;

    fn resolve(node: &SchemaNode) -> ResolvedNode {
        SchemaRegistry::new().resolve(node).unwrap()
    }

    #[test]
    fn no_implicit_numeric_string_coercion() {
        let schema = resolve(&SchemaNode::integer());
        let error = decode(&schema, &json!("3")).unwrap_err();
        assert_eq!(error.expected, "integer");
        assert_eq!(error.found, "string \"3\"");
        assert!(decode(&schema, &json!(3.5)).is_err());
        assert_eq!(decode(&schema, &json!(3)), Ok(Decoded::Integer(3)));
    }

    #[test]
    fn large_integers_are_range_checked_exactly() {
        let schema = resolve(
            &SchemaNode::integer()
                .with_guide(crate::guide::Guide::range(0.0, 9_007_199_254_740_992.0).unwrap())
                .unwrap(),
        );
        assert_eq!(
            decode(&schema, &json!(9_007_199_254_740_992_i64)),
            Ok(Decoded::Integer(9_007_199_254_740_992))
        );
        let error = decode(&schema, &json!(9_007_199_254_740_993_i64)).unwrap_err();
        assert_eq!(error.path, Path::root());
    }

    #[test]
    fn element_errors_take_priority_over_count() {
        let schema = resolve(
            &SchemaNode::array(SchemaNode::integer())
                .with_guide(crate::guide::Guide::count(0, 2).unwrap())
                .unwrap(),
        );
        let error = decode(&schema, &json!([1, 2, "x", 4])).unwrap_err();
        assert_eq!(error.path.to_string(), "$[2]");

        let error = decode(&schema, &json!([1, 2, 3])).unwrap_err();
        assert_eq!(error.path, Path::root());
        assert_eq!(error.expected, "array with count(0, 2)");
    }

    #[test]
    fn objects_carry_unknown_keys_and_drop_null_optionals() {
        let schema = resolve(
            &SchemaNode::object()
                .required("name", SchemaNode::string())
                .optional("nickname", SchemaNode::string())
                .build()
                .unwrap(),
        );
        let decoded = decode(&schema, &json!({ "name": "Ada", "nickname": null, "extra": 1 })).unwrap();
        assert_eq!(decoded.encode(), json!({ "name": "Ada", "extra": 1 }));
        assert_eq!(decoded.field("extra"), None);

        let error = decode(&schema, &json!({ "nickname": "A" })).unwrap_err();
        assert_eq!(error.path.to_string(), "$.name");
        assert_eq!(error.found, "nothing");
    }

    #[test]
    fn enum_match_is_exact() {
        let schema = resolve(&SchemaNode::enum_of(["low", "high"]).unwrap());
        assert_eq!(decode(&schema, &json!("low")), Ok(Decoded::Enum("low".into())));
        assert!(decode(&schema, &json!("LOW")).is_err());
    }

    #[test]
    fn union_error_lists_every_alternative() {
        let schema = resolve(
            &SchemaNode::union(vec![SchemaNode::boolean(), SchemaNode::integer()]).unwrap(),
        );
        let error = decode(&schema, &json!("yes")).unwrap_err();
        assert_eq!(error.alternatives.len(), 2);
        let message = error.to_string();
        assert!(message.contains("alternative 0: at $: expected boolean"));
        assert!(message.contains("alternative 1: at $: expected integer"));
    }
}
