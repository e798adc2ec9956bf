//! Runtime-built schemas for structured generation.
//!
//! Build [`SchemaNode`]s, register named ones in a [`SchemaRegistry`],
//! resolve references into a [`ResolvedNode`], check it with
//! [`SchemaValidator`], then [`decode`] generator output against it or turn
//! it into form fields with [`describe_form`].
//!
//! Everything here is synchronous and side-effect free; the library does
//! not log.
pub mod catalog;
pub mod decode;
pub mod error;
pub mod form;
pub mod guide;
pub mod interchange;
pub mod node;
pub mod path;
pub mod path_de;
pub mod registry;
pub mod resolved;
pub mod validate;

pub use decode::{DecodeError, Decoded, decode};
pub use error::{Rule, SchemaError};
pub use form::{FieldDescriptor, InputKind, describe_form};
pub use guide::{Guide, GuideKind, Literal};
pub use node::{NodeKind, PrimitiveKind, Property, SchemaNode};
pub use path::{Path, Segment};
pub use path_de::{TypedDecodeError, decode_typed};
pub use registry::SchemaRegistry;
pub use resolved::{ResolvedNode, ResolvedProperty, ResolvedReference};
pub use validate::{Finding, FindingKind, Report, SchemaValidator, Severity, ValidatorConfig, validate};
