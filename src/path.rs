//! Structural paths shared by validation findings, decode errors and form descriptors.
use std::fmt;

use serde::{Serialize, Serializer};

/// One step from a parent node (or value) to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object property.
    Field(String),
    /// Concrete position inside a value array.
    Index(usize),
    /// Array element schema (`[]`), used on schema paths.
    Element,
    /// Union alternative by declaration index.
    Alternative(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
    pub fn field(&self, name: &str) -> Self {
        self.child(Segment::Field(name.to_string()))
    }
    pub fn index(&self, index: usize) -> Self {
        self.child(Segment::Index(index))
    }
    pub fn element(&self) -> Self {
        self.child(Segment::Element)
    }
    pub fn alternative(&self, index: usize) -> Self {
        self.child(Segment::Alternative(index))
    }
    /// Only the property names along the path, in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter_map(|s| match s {
                Segment::Field(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
    /// Dotted form used by form descriptors (`address.city`, `tags[]`).
    pub fn dotted(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                Segment::Index(i) => out.push_str(&format!("[{i}]")),
                Segment::Element => out.push_str("[]"),
                Segment::Alternative(i) => out.push_str(&format!("<{i}>")),
            }
        }
        out
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl<'a> From<&[&'a str]> for Path {
    fn from(fields: &[&'a str]) -> Self {
        Self(fields.iter().map(|f| Segment::Field(f.to_string())).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(i) => write!(f, "[{i}]")?,
                Segment::Element => f.write_str("[]")?,
                Segment::Alternative(i) => write!(f, "<{i}>")?,
            }
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_dotted_forms() {
        let path = Path::root().field("items").index(0).field("name");
        assert_eq!(path.to_string(), "$.items[0].name");
        assert_eq!(path.dotted(), "items[0].name");
        assert_eq!(path.field_names(), vec!["items", "name"]);

        let schema_path = Path::root().field("value").alternative(1).element();
        assert_eq!(schema_path.to_string(), "$.value<1>[]");
        assert_eq!(Path::root().to_string(), "$");
    }
}
