//! Fail-fast errors raised while building and resolving schemas.
//!
//! Validation findings are not errors (see [`crate::validate`]); decode
//! failures live in [`crate::decode`].
use thiserror::Error;

use crate::guide::GuideKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Guide parameters are internally inconsistent.
    #[error("invalid `{kind}` guide: {reason}")]
    InvalidGuide { kind: GuideKind, reason: String },
    /// A local structural rule was violated by a builder call.
    #[error("malformed schema: {0}")]
    MalformedSchema(Rule),
    #[error("unresolved reference `{0}`")]
    UnresolvedReference(String),
    /// Ordered names from the first reference to the repeated one.
    #[error("cyclic reference: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),
    /// A registry entry was replaced or removed after a tree resolved against it.
    #[error("stale reference `{0}`: registry entry changed after resolution")]
    StaleReference(String),
}

/// Local construction rules checked by the builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rule {
    #[error("enum needs at least one value")]
    EmptyEnum,
    #[error("enum values must be non-empty strings")]
    EmptyEnumValue,
    #[error("duplicate enum value `{0}`")]
    DuplicateEnumValue(String),
    #[error("property names must be non-empty")]
    EmptyPropertyName,
    #[error("duplicate property name `{0}`")]
    DuplicatePropertyName(String),
    #[error("union needs at least 2 alternatives, got {0}")]
    TooFewUnionAlternatives(usize),
    #[error("reference names must be non-empty")]
    EmptyReferenceName,
    #[error("references cannot carry guides")]
    GuideOnReference,
}

impl From<Rule> for SchemaError {
    fn from(rule: Rule) -> Self {
        SchemaError::MalformedSchema(rule)
    }
}

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;
