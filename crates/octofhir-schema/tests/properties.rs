//! End-to-end behaviour across type building, codecs and filters

use octofhir_schema::ast::{ComparisonOperator, Expression, Literal, LogicalOperator};
use octofhir_schema::diagnostics::{SCH0114, SCH0201, SCH0209};
use octofhir_schema::types::{
    ComplexTypeDeclaration, FieldDeclaration, MappedTypeDeclaration, TypeDeclaration, UnionTypeDeclaration,
};
use octofhir_schema::{
    CodecGenerator, CodecOptions, Direction, DocumentDeclaration, SchemaError, TypeBuilder, TypeDocument,
    parse_filter,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

fn codecs(json: &str) -> CodecGenerator {
    let doc = TypeDocument::from_json(json).unwrap_or_else(|e| panic!("build failed: {e}"));
    CodecGenerator::new(Arc::new(doc))
}

fn field_names(doc: &TypeDocument, name: &str) -> Vec<String> {
    doc.get_type(name)
        .and_then(|t| t.fields())
        .map(|table| table.iter().map(|f| format!("{}:{}", f.name, f.ty.name)).collect())
        .unwrap_or_default()
}

// === Type graph ===

#[test]
fn test_subtype_fields_are_a_superset_of_base_fields() {
    let doc = TypeDocument::from_json(
        r#"{
            "Base": {"fields": {"id": "integer", "name": "string"}},
            "Child": {"base": "Base", "fields": {"name": "date", "extra": "boolean"}}
        }"#,
    )
    .unwrap();
    assert_eq!(field_names(&doc, "Child"), vec!["id:integer", "name:date", "extra:boolean"]);
    assert!(doc.is_derived_from("child", "BASE"));
}

#[test]
fn test_self_base_is_circular_before_any_codec() {
    let mut builder = TypeBuilder::new("default");
    builder
        .register("type1", ComplexTypeDeclaration::new().with_base("type1").into())
        .unwrap();
    let err = builder.build().unwrap_err();
    assert_eq!(err.code(), SCH0114);
    assert_eq!(err, SchemaError::CircularReference { chain: vec!["type1".into(), "type1".into()] });
}

#[test]
fn test_forward_base_reference_and_default_kind() {
    let doc = TypeDocument::from_json(r#"{"type1": {"base": "type2"}, "type2": {}}"#).unwrap();
    let base = doc.get_type("type1").and_then(|t| t.base()).map(|b| b.name().to_string());
    assert_eq!(base.as_deref(), Some("type2"));
}

#[test]
fn test_duplicate_registration() {
    let mut builder = TypeBuilder::new("default");
    let decl = ComplexTypeDeclaration::new().with_field("a", "string");
    builder.register("A", decl.clone().into()).unwrap();
    builder.register("A", decl.into()).unwrap();
    let err = builder
        .register("a", ComplexTypeDeclaration::new().with_field("b", "string").into())
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateName { .. }), "{err}");
}

#[test]
fn test_builder_api_matches_json_declarations() {
    let declared = DocumentDeclaration::new("default")
        .with_type("User", ComplexTypeDeclaration::new().with_field("id", FieldDeclaration::new("integer").required()))
        .with_type(
            "UserId",
            TypeDeclaration::from(MappedTypeDeclaration::pick("User", ["id"])),
        )
        .with_type("Either", UnionTypeDeclaration::new(["User", "UserId"]));
    let parsed = DocumentDeclaration::from_json(
        r#"{"types": {
            "User": {"fields": {"id": {"type": "integer", "required": true}}},
            "UserId": {"kind": "Mapped", "base": "User", "pick": ["id"]},
            "Either": {"kind": "Union", "members": ["User", "UserId"]}
        }}"#,
    )
    .unwrap();
    assert_eq!(declared, parsed);
}

// === Codecs ===

const UNION: &str = r#"{
    "Cat": {"fields": {"meow": {"type": "boolean", "required": true}}},
    "Dog": {"fields": {"bark": {"type": "boolean", "required": true}}},
    "Pet": {"kind": "Union", "members": ["Cat", "Dog"]}
}"#;

#[rstest]
#[case(json!({"meow": true}), Some(json!({"meow": true})))]
#[case(json!({"bark": "false"}), Some(json!({"bark": false})))]
#[case(json!({"meow": true, "bark": true}), Some(json!({"meow": true})))]
#[case(json!({"meow": 1}), None)]
#[case(json!(7), None)]
fn test_union_decode_succeeds_iff_a_member_does(#[case] input: Value, #[case] expected: Option<Value>) {
    let codecs = codecs(UNION);
    let options = CodecOptions::new();
    let members = ["Cat", "Dog"].map(|m| codecs.decode(m, &input, &options).ok());
    let union = codecs.decode("Pet", &input, &options);

    assert_eq!(union.as_ref().ok().cloned(), expected);
    assert_eq!(union.is_ok(), members.iter().any(Option::is_some));
    if let Some(first) = members.iter().flatten().next() {
        assert_eq!(union.ok().as_ref(), Some(first));
    } else {
        assert!(matches!(union, Err(SchemaError::Validation(e)) if e.code() == SCH0209));
    }
}

#[test]
fn test_pick_with_forbid_keeps_only_picked_keys() {
    let codecs = codecs(
        r#"{
            "Base": {"additionalFields": "forbid", "fields": {
                "x": {"type": "integer", "required": true}, "y": "string"
            }},
            "OnlyX": {"kind": "Mapped", "base": "Base", "pick": ["x"]},
            "MaybeX": {"kind": "Mapped", "base": "OnlyX", "partial": ["x"]}
        }"#,
    );
    let options = CodecOptions::new();
    assert_eq!(
        codecs.decode("OnlyX", &json!({"x": 1, "y": "a", "z": 2}), &options).unwrap(),
        json!({"x": 1})
    );
    match codecs.decode("OnlyX", &json!({"y": "a"}), &options) {
        Err(SchemaError::Validation(err)) => assert_eq!(err.issues_at("x").next().map(|i| i.code), Some(SCH0201)),
        other => panic!("expected missing x, got {other:?}"),
    }
    assert_eq!(codecs.decode("MaybeX", &json!({"y": "a"}), &options).unwrap(), json!({}));
}

#[test]
fn test_generated_codecs_are_reused() {
    let codecs = codecs(UNION);
    let options = CodecOptions::new();
    let first = codecs.generate("Pet", Direction::Decode, &options).unwrap();
    let second = codecs.generate("pet", Direction::Decode, &CodecOptions::new()).unwrap();
    assert!(first.ptr_eq(&second));
    assert!(!first.ptr_eq(&codecs.generate("Pet", Direction::Decode, &options.clone().partial()).unwrap()));
}

const FLAT: &str = r#"{"Flat": {"fields": {
    "id": {"type": "integer", "required": true},
    "label": {"type": "string", "required": true},
    "score": {"type": "number", "required": true},
    "on": {"type": "boolean", "required": true}
}}}"#;

proptest! {
    #[test]
    fn prop_round_trip(id in any::<i64>(), label in "\\PC{0,10}", score in -1.0e6f64..1.0e6, on in any::<bool>()) {
        let codecs = codecs(FLAT);
        let options = CodecOptions::new();
        let x = json!({"id": id, "label": label, "score": score, "on": on});
        let encoded = codecs.encode("Flat", &x, &options).unwrap();
        let decoded = codecs.decode("Flat", &encoded, &options).unwrap();
        prop_assert_eq!(codecs.encode("Flat", &decoded, &options).unwrap(), encoded);
    }

    #[test]
    fn prop_repeated_generation_is_idempotent(value in prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[0-9a-z]{0,3}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]) {
        let codecs = codecs(FLAT);
        let input = json!({"id": value.clone(), "label": value.clone(), "score": value, "on": true});
        let first = codecs.generate("Flat", Direction::Decode, &CodecOptions::new()).unwrap();
        let second = codecs.generate("Flat", Direction::Decode, &CodecOptions::new()).unwrap();
        prop_assert_eq!(first.apply(&input).ok(), second.apply(&input).ok());
    }
}

// === Filters ===

#[test]
fn test_simple_comparison() {
    assert_eq!(
        parse_filter("id=1").unwrap(),
        Expression::comparison(
            Expression::identifier("id"),
            ComparisonOperator::Equal,
            Expression::Literal(Literal::from(1i64)),
        )
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    let Expression::Logical(or) = parse_filter("a=1 or b=2 and c=3").unwrap() else {
        panic!("expected a logical expression");
    };
    assert_eq!(or.op, LogicalOperator::Or);
    assert_eq!(or.items.len(), 2);
    assert!(matches!(&or.items[1], Expression::Logical(and) if and.op == LogicalOperator::And));
}

#[test]
fn test_escaped_quote() {
    let expr = parse_filter(r"name='O\'Brien'").unwrap();
    let right = expr.as_comparison().and_then(|c| c.right.as_literal()).and_then(Literal::as_str);
    assert_eq!(right, Some("O'Brien"));
}

#[test]
fn test_filter_text_as_a_field_type() {
    let codecs = codecs(r#"{"Query": {"fields": {"filter": "filter", "sort": {"type": {"kind": "Simple", "codec": "field-path", "allowSigns": "first"}, "isArray": true}}}}"#);
    let options = CodecOptions::new();
    let decoded = codecs
        .decode("Query", &json!({"filter": "a=1 OR b IN [1,2]", "sort": ["-createdAt", "name"]}), &options)
        .unwrap();
    assert_eq!(decoded, json!({"filter": "a = 1 or b in [1, 2]", "sort": ["-createdAt", "name"]}));
    assert!(codecs.decode("Query", &json!({"filter": "a = "}), &options).is_err());
    assert!(codecs.decode("Query", &json!({"sort": ["a.-b"]}), &options).is_err());
}
