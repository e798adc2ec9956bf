//! Serde deserialization with JSON-path context in error messages.
//!
//! [`decode_typed`] is the statically-typed counterpart of [`crate::decode`]:
//! check the runtime schema first, then hand the decoded tree to serde.
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::decode::{DecodeError, decode};
use crate::resolved::ResolvedNode;

#[derive(Debug, Error)]
pub enum TypedDecodeError {
    #[error(transparent)]
    Schema(#[from] DecodeError),
    /// Schema-valid data that does not fit the Rust type.
    #[error("at JSON path {path} → {message}")]
    Shape { path: String, message: String },
}

pub fn decode_typed<T: DeserializeOwned>(
    schema: &ResolvedNode,
    value: &Value,
) -> Result<T, TypedDecodeError> {
    let decoded = decode(schema, value)?;
    serde_path_to_error::deserialize(decoded.encode()).map_err(|err| TypedDecodeError::Shape {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SchemaNode;
    use crate::registry::SchemaRegistry;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Book {
        title: String,
        pages: u32,
    }

    fn book_schema() -> ResolvedNode {
        let node = SchemaNode::object()
            .required("title", SchemaNode::string())
            .required("pages", SchemaNode::integer())
            .build()
            .unwrap();
        SchemaRegistry::new().resolve(&node).unwrap()
    }

    #[test]
    fn typed_decode_checks_schema_then_shape() {
        let schema = book_schema();
        let book: Book = decode_typed(&schema, &json!({ "title": "Dune", "pages": 412 })).unwrap();
        assert_eq!(book, Book { title: "Dune".into(), pages: 412 });

        let missing = decode_typed::<Book>(&schema, &json!({ "title": "Dune" }));
        assert!(matches!(missing, Err(TypedDecodeError::Schema(_))));

        let negative = decode_typed::<Book>(&schema, &json!({ "title": "Dune", "pages": -1 }));
        let Err(TypedDecodeError::Shape { path, .. }) = negative else {
            panic!("expected a shape error, got {negative:?}");
        };
        assert_eq!(path, "pages");
    }

    #[test]
    fn config_errors_carry_paths() {
        let err = from_str_with_path::<crate::validate::ValidatorConfig>(r#"{"max_depth": "deep"}"#)
            .unwrap_err();
        assert!(err.starts_with("at JSON path max_depth"));
    }
}
