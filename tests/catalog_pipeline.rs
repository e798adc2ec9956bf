//! Every catalog example through the full pipeline: resolve, validate, decode, describe.

use dynschema::catalog::{ExampleKind, Recipe};
use dynschema::interchange::{document, from_json_schema};
use dynschema::{InputKind, SchemaError, decode, decode_typed, describe_form, validate};
use serde_json::json;

fn working_examples() -> impl Iterator<Item = ExampleKind> {
    ExampleKind::ALL.into_iter().filter(|kind| *kind != ExampleKind::ErrorHandling)
}

#[test]
fn samples_decode_against_valid_schemas() {
    for kind in working_examples() {
        let example = kind.build().unwrap();
        let resolved = example
            .registry
            .resolve(&example.root)
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        let report = validate(&resolved);
        assert!(report.findings.is_empty(), "{kind}: {:?}", report.findings);

        let decoded = decode(&resolved, &example.sample).unwrap_or_else(|e| panic!("{kind}: {e}"));
        let again = decode(&resolved, &decoded.encode()).unwrap();
        assert_eq!(again, decoded, "{kind}: decode is not idempotent");
    }
}

#[test]
fn error_handling_example_names_the_missing_definition() {
    let example = ExampleKind::ErrorHandling.build().unwrap();
    assert_eq!(
        example.registry.resolve(&example.root),
        Err(SchemaError::UnresolvedReference("Customer".into()))
    );
}

#[test]
fn interchange_documents_round_trip() {
    for kind in ExampleKind::ALL {
        let example = kind.build().unwrap();
        let emitted = document(&example.registry, &example.root);
        let parsed = from_json_schema(&emitted).unwrap_or_else(|e| panic!("{kind}: {e}"));
        assert_eq!(parsed.root, example.root, "{kind}");
        assert_eq!(parsed.definitions.len(), example.registry.len(), "{kind}");
        for (name, node) in &parsed.definitions {
            assert_eq!(Some(node), example.registry.get(name), "{kind}: {name}");
        }
    }
}

#[test]
fn generable_sample_decodes_into_rust_type() {
    let example = ExampleKind::GenerablePattern.build().unwrap();
    let resolved = example.registry.resolve(&example.root).unwrap();
    let recipe: Recipe = decode_typed(&resolved, &example.sample).unwrap();
    assert_eq!(recipe.servings, 4);
    assert_eq!(recipe.difficulty, "easy");

    // schema rejects before serde ever sees it
    let too_many = json!({ "name": "Feast", "servings": 40, "ingredients": ["rice"], "difficulty": "hard" });
    assert!(decode_typed::<Recipe>(&resolved, &too_many).is_err());
}

#[test]
fn invoice_errors_point_at_the_offending_line_item() {
    let example = ExampleKind::InvoiceProcessing.build().unwrap();
    let resolved = example.registry.resolve(&example.root).unwrap();
    let mut bad = example.sample.clone();
    bad["lineItems"][1]["quantity"] = json!(0);
    let error = decode(&resolved, &bad).unwrap_err();
    assert_eq!(error.path.to_string(), "$.lineItems[1].quantity");
    assert_eq!(error.expected, "integer with range(1, ..)");
}

#[test]
fn form_builder_fields() {
    let example = ExampleKind::FormBuilder.build().unwrap();
    let resolved = example.registry.resolve(&example.root).unwrap();
    let fields = describe_form(&resolved);
    let paths: Vec<&str> = fields.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "fullName",
            "ticket",
            "guests",
            "newsletter",
            "mailingAddress.street",
            "mailingAddress.city",
            "mailingAddress.postalCode",
            "dietaryNeeds",
        ]
    );
    assert_eq!(fields[1].input, InputKind::Picker(vec!["standard".into(), "vip".into()]));
    assert_eq!(fields[3].input, InputKind::Toggle);
    assert_eq!(fields[4].label, "Street");
    assert!(!fields[4].required);
}
