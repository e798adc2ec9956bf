//! Built-in demonstration schemas, one per runtime-schema technique.
//!
//! Each entry builds its own registry, a root node and a sample generator
//! output to decode against it.
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::guide::{Guide, Literal};
use crate::node::SchemaNode;
use crate::registry::SchemaRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExampleKind {
    BasicObject,
    ArraySchema,
    EnumSchema,
    NestedObjects,
    SchemaReferences,
    GenerationGuides,
    GenerablePattern,
    UnionTypes,
    FormBuilder,
    ErrorHandling,
    InvoiceProcessing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Complexity {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone)]
pub struct Example {
    pub kind: ExampleKind,
    pub registry: SchemaRegistry,
    pub root: SchemaNode,
    pub sample: Value,
}

/// Typed mirror of the `generable_pattern` schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub difficulty: String,
}

// ————————————————————————————————————————————————————————————————————————————
// METADATA
// ————————————————————————————————————————————————————————————————————————————

impl ExampleKind {
    pub const ALL: [ExampleKind; 11] = [
        ExampleKind::BasicObject,
        ExampleKind::ArraySchema,
        ExampleKind::EnumSchema,
        ExampleKind::NestedObjects,
        ExampleKind::SchemaReferences,
        ExampleKind::GenerationGuides,
        ExampleKind::GenerablePattern,
        ExampleKind::UnionTypes,
        ExampleKind::FormBuilder,
        ExampleKind::ErrorHandling,
        ExampleKind::InvoiceProcessing,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ExampleKind::BasicObject => "basic_object",
            ExampleKind::ArraySchema => "array_schema",
            ExampleKind::EnumSchema => "enum_schema",
            ExampleKind::NestedObjects => "nested_objects",
            ExampleKind::SchemaReferences => "schema_references",
            ExampleKind::GenerationGuides => "generation_guides",
            ExampleKind::GenerablePattern => "generable_pattern",
            ExampleKind::UnionTypes => "union_types",
            ExampleKind::FormBuilder => "form_builder",
            ExampleKind::ErrorHandling => "error_handling",
            ExampleKind::InvoiceProcessing => "invoice_processing",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ExampleKind::BasicObject => "Basic Object Schema",
            ExampleKind::ArraySchema => "Array Schemas",
            ExampleKind::EnumSchema => "Enum Schemas",
            ExampleKind::NestedObjects => "Nested Objects",
            ExampleKind::SchemaReferences => "Schema References",
            ExampleKind::GenerationGuides => "Generation Guides",
            ExampleKind::GenerablePattern => "Typed Generation",
            ExampleKind::UnionTypes => "Union Types (anyOf)",
            ExampleKind::FormBuilder => "Dynamic Form Builder",
            ExampleKind::ErrorHandling => "Error Handling",
            ExampleKind::InvoiceProcessing => "Invoice Processing",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            ExampleKind::BasicObject => "Create simple object schemas at runtime",
            ExampleKind::ArraySchema => "Arrays with min/max constraints",
            ExampleKind::EnumSchema => "String enumerations and choices",
            ExampleKind::NestedObjects => "Complex nested object structures",
            ExampleKind::SchemaReferences => "Schemas referencing other schemas",
            ExampleKind::GenerationGuides => "Apply constraints to generated values",
            ExampleKind::GenerablePattern => "Decode into a Rust type after schema checks",
            ExampleKind::UnionTypes => "Multiple type alternatives",
            ExampleKind::FormBuilder => "Build forms dynamically from a schema",
            ExampleKind::ErrorHandling => "Handle schema errors gracefully",
            ExampleKind::InvoiceProcessing => "Real-world invoice data extraction",
        }
    }

    pub fn complexity(self) -> Complexity {
        match self {
            ExampleKind::BasicObject | ExampleKind::ArraySchema | ExampleKind::EnumSchema => {
                Complexity::Beginner
            }
            ExampleKind::NestedObjects
            | ExampleKind::GenerationGuides
            | ExampleKind::GenerablePattern => Complexity::Intermediate,
            ExampleKind::SchemaReferences | ExampleKind::UnionTypes | ExampleKind::ErrorHandling => {
                Complexity::Advanced
            }
            ExampleKind::FormBuilder | ExampleKind::InvoiceProcessing => Complexity::Expert,
        }
    }

    pub fn build(self) -> Result<Example> {
        let mut registry = SchemaRegistry::new();
        let (root, sample) = match self {
            ExampleKind::BasicObject => basic_object()?,
            ExampleKind::ArraySchema => array_schema()?,
            ExampleKind::EnumSchema => enum_schema()?,
            ExampleKind::NestedObjects => nested_objects()?,
            ExampleKind::SchemaReferences => schema_references(&mut registry)?,
            ExampleKind::GenerationGuides => generation_guides()?,
            ExampleKind::GenerablePattern => generable_pattern()?,
            ExampleKind::UnionTypes => union_types()?,
            ExampleKind::FormBuilder => form_builder(&mut registry)?,
            ExampleKind::ErrorHandling => error_handling(&mut registry)?,
            ExampleKind::InvoiceProcessing => invoice_processing(&mut registry)?,
        };
        Ok(Example { kind: self, registry, root, sample })
    }
}

impl Complexity {
    pub fn label(self) -> &'static str {
        match self {
            Complexity::Beginner => "Beginner",
            Complexity::Intermediate => "Intermediate",
            Complexity::Advanced => "Advanced",
            Complexity::Expert => "Expert",
        }
    }
}

impl fmt::Display for ExampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExampleKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ExampleKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| format!("unknown example `{s}`"))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMAS
// ————————————————————————————————————————————————————————————————————————————

fn basic_object() -> Result<(SchemaNode, Value)> {
    let root = SchemaNode::object()
        .description("A person")
        .required("name", SchemaNode::string())
        .required("age", SchemaNode::integer().with_guide(Guide::range(0.0, 120.0)?)?)
        .optional("email", SchemaNode::string().with_guide(Guide::pattern(r"[^@\s]+@[^@\s]+\.[a-z]+")?)?)
        .build()?;
    Ok((root, json!({ "name": "Ada Lovelace", "age": 36 })))
}

fn array_schema() -> Result<(SchemaNode, Value)> {
    let root = SchemaNode::object()
        .required("title", SchemaNode::string())
        .required(
            "items",
            SchemaNode::array(SchemaNode::string()).with_guide(Guide::count(1, 10)?)?,
        )
        .describe("Between one and ten entries")
        .build()?;
    Ok((root, json!({ "title": "Groceries", "items": ["eggs", "milk", "bread"] })))
}

fn enum_schema() -> Result<(SchemaNode, Value)> {
    let root = SchemaNode::object()
        .required("summary", SchemaNode::string())
        .required("priority", SchemaNode::enum_of(["low", "medium", "high", "critical"])?)
        .required(
            "category",
            SchemaNode::string().with_guide(Guide::choices(["bug", "feature", "question"])?)?,
        )
        .build()?;
    Ok((root, json!({ "summary": "Crash on launch", "priority": "critical", "category": "bug" })))
}

fn nested_objects() -> Result<(SchemaNode, Value)> {
    let address = SchemaNode::object()
        .required("street", SchemaNode::string())
        .required("city", SchemaNode::string())
        .required("country", SchemaNode::string())
        .build()?;
    let person = SchemaNode::object()
        .required("name", SchemaNode::string())
        .required("title", SchemaNode::string())
        .build()?;
    let root = SchemaNode::object()
        .description("A company profile")
        .required("name", SchemaNode::string())
        .required("headquarters", address)
        .required("ceo", person)
        .optional("founded", SchemaNode::integer().with_guide(Guide::range(1800.0, 2100.0)?)?)
        .build()?;
    let sample = json!({
        "name": "Acme Robotics",
        "headquarters": { "street": "1 Main St", "city": "Springfield", "country": "US" },
        "ceo": { "name": "Rosa Diaz", "title": "Chief Executive Officer" },
        "founded": 1998
    });
    Ok((root, sample))
}

fn schema_references(registry: &mut SchemaRegistry) -> Result<(SchemaNode, Value)> {
    registry.register(
        "Address",
        SchemaNode::object()
            .required("street", SchemaNode::string())
            .required("city", SchemaNode::string())
            .build()?,
    );
    registry.register(
        "Person",
        SchemaNode::object()
            .required("name", SchemaNode::string())
            .required("home", SchemaNode::reference("Address")?)
            .optional("work", SchemaNode::reference("Address")?)
            .build()?,
    );
    let sample = json!({
        "name": "Grace Hopper",
        "home": { "street": "12 Harbor Rd", "city": "Arlington" }
    });
    Ok((SchemaNode::reference("Person")?, sample))
}

fn generation_guides() -> Result<(SchemaNode, Value)> {
    let root = SchemaNode::object()
        .required("sku", SchemaNode::string().with_guide(Guide::pattern(r"[A-Z]{3}-\d{4}")?)?)
        .required("rating", SchemaNode::number().with_guide(Guide::range(1.0, 5.0)?)?)
        .required(
            "tags",
            SchemaNode::array(SchemaNode::string()).with_guide(Guide::count(1, 3)?)?,
        )
        .required("size", SchemaNode::string().with_guide(Guide::choices(["S", "M", "L"])?)?)
        .build()?;
    let sample = json!({ "sku": "HAT-0042", "rating": 4.5, "tags": ["wool", "winter"], "size": "M" });
    Ok((root, sample))
}

fn generable_pattern() -> Result<(SchemaNode, Value)> {
    let root = SchemaNode::object()
        .required("name", SchemaNode::string())
        .required("servings", SchemaNode::integer().with_guide(Guide::range(1.0, 12.0)?)?)
        .required(
            "ingredients",
            SchemaNode::array(SchemaNode::string()).with_guide(Guide::count_at_least(1)?)?,
        )
        .required("difficulty", SchemaNode::enum_of(["easy", "medium", "hard"])?)
        .build()?;
    let sample = json!({
        "name": "Pancakes",
        "servings": 4,
        "ingredients": ["flour", "milk", "eggs"],
        "difficulty": "easy"
    });
    Ok((root, sample))
}

fn union_types() -> Result<(SchemaNode, Value)> {
    let email = SchemaNode::object()
        .required("email", SchemaNode::string().with_guide(Guide::pattern(r"[^@\s]+@[^@\s]+")?)?)
        .build()?;
    let phone = SchemaNode::object()
        .required("phone", SchemaNode::string().with_guide(Guide::pattern(r"\+?[0-9 ()-]{7,}")?)?)
        .build()?;
    let root = SchemaNode::object()
        .required("name", SchemaNode::string())
        .required("contact", SchemaNode::union(vec![email, phone])?)
        .describe("Either an email or a phone number")
        .required(
            "pet",
            SchemaNode::union(vec![SchemaNode::enum_of(["cat", "dog"])?, SchemaNode::number()])?,
        )
        .build()?;
    let sample = json!({ "name": "Lin", "contact": { "phone": "+1 555 0100" }, "pet": "dog" });
    Ok((root, sample))
}

fn form_builder(registry: &mut SchemaRegistry) -> Result<(SchemaNode, Value)> {
    registry.register(
        "Address",
        SchemaNode::object()
            .required("street", SchemaNode::string())
            .required("city", SchemaNode::string())
            .optional("postalCode", SchemaNode::string().with_guide(Guide::pattern(r"[0-9A-Z -]{3,10}")?)?)
            .build()?,
    );
    let root = SchemaNode::object()
        .description("Event registration")
        .required("fullName", SchemaNode::string())
        .required("ticket", SchemaNode::string().with_guide(Guide::choices(["standard", "vip"])?)?)
        .required("guests", SchemaNode::integer().with_guide(Guide::range(0.0, 4.0)?)?)
        .optional("newsletter", SchemaNode::boolean())
        .optional("mailingAddress", SchemaNode::reference("Address")?)
        .optional(
            "dietaryNeeds",
            SchemaNode::array(SchemaNode::enum_of(["vegetarian", "vegan", "gluten_free"])?),
        )
        .build()?;
    let sample = json!({
        "fullName": "Sam Okafor",
        "ticket": "vip",
        "guests": 1,
        "newsletter": true,
        "dietaryNeeds": ["vegan"]
    });
    Ok((root, sample))
}

fn error_handling(registry: &mut SchemaRegistry) -> Result<(SchemaNode, Value)> {
    // `Customer` is deliberately never registered
    registry.register(
        "Order",
        SchemaNode::object()
            .required("id", SchemaNode::string())
            .required("customer", SchemaNode::reference("Customer")?)
            .build()?,
    );
    Ok((SchemaNode::reference("Order")?, json!({ "id": "A-1", "customer": { "name": "?" } })))
}

fn invoice_processing(registry: &mut SchemaRegistry) -> Result<(SchemaNode, Value)> {
    registry.register(
        "Vendor",
        SchemaNode::object()
            .required("name", SchemaNode::string())
            .optional("taxId", SchemaNode::string())
            .build()?,
    );
    registry.register(
        "LineItem",
        SchemaNode::object()
            .required("description", SchemaNode::string())
            .required("quantity", SchemaNode::integer().with_guide(Guide::minimum(1.0)?)?)
            .required("unitPrice", SchemaNode::number().with_guide(Guide::minimum(0.0)?)?)
            .build()?,
    );
    let root = SchemaNode::object()
        .description("An invoice extracted from a document")
        .required("invoiceNumber", SchemaNode::string().with_guide(Guide::pattern(r"INV-\d{4,}")?)?)
        .required("issueDate", SchemaNode::string().with_guide(Guide::pattern(r"\d{4}-\d{2}-\d{2}")?)?)
        .required("vendor", SchemaNode::reference("Vendor")?)
        .required(
            "lineItems",
            SchemaNode::array(SchemaNode::reference("LineItem")?).with_guide(Guide::count_at_least(1)?)?,
        )
        .required("currency", SchemaNode::enum_of(["USD", "EUR", "GBP"])?)
        .required("total", SchemaNode::number().with_guide(Guide::minimum(0.0)?)?)
        .optional(
            "status",
            SchemaNode::string().with_guide(Guide::choices([
                Literal::from("draft"),
                Literal::from("sent"),
                Literal::from("paid"),
            ])?)?,
        )
        .build()?;
    let sample = json!({
        "invoiceNumber": "INV-20931",
        "issueDate": "2025-10-27",
        "vendor": { "name": "Northwind Traders" },
        "lineItems": [
            { "description": "Widget", "quantity": 3, "unitPrice": 9.5 },
            { "description": "Gadget", "quantity": 1, "unitPrice": 120 }
        ],
        "currency": "USD",
        "total": 148.5,
        "status": "sent"
    });
    Ok((root, sample))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_back() {
        for kind in ExampleKind::ALL {
            assert_eq!(kind.id().parse::<ExampleKind>(), Ok(kind));
        }
        assert!("generable".parse::<ExampleKind>().is_err());
    }

    #[test]
    fn every_example_builds() {
        for kind in ExampleKind::ALL {
            let example = kind.build().unwrap();
            assert_eq!(example.kind, kind);
        }
    }
}
