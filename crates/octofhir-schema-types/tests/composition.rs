//! Composition rules across complex, mixin, union, mapped and enum types

use octofhir_schema_diagnostics::SchemaError;
use octofhir_schema_types::{
    AdditionalFields, ComplexTypeDeclaration, DataType, DocumentDeclaration, EnumTypeDeclaration, FieldDeclaration,
    MixinTypeDeclaration, TypeDocument, TypeKind, UnionTypeDeclaration,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

fn build(json: &str) -> TypeDocument {
    TypeDocument::from_json(json).unwrap_or_else(|e| panic!("build failed: {e}"))
}

fn ty<'a>(doc: &'a TypeDocument, name: &str) -> &'a Arc<DataType> {
    doc.get_type(name).unwrap_or_else(|| panic!("type {name} missing"))
}

/// (field name, origin, type name)
fn field_summary(ty: &DataType) -> Vec<(String, String, String)> {
    ty.fields()
        .map(|table| {
            table
                .iter()
                .map(|f| (f.name.clone(), f.origin.clone(), f.ty.name.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn s(a: &str, b: &str, c: &str) -> (String, String, String) {
    (a.into(), b.into(), c.into())
}

#[test]
fn test_subtype_fields_include_base_and_redeclaration_replaces() {
    let doc = build(
        r#"{
            "Animal": {"fields": {"id": "uuid", "name": "string", "legs": "integer"}},
            "Bird": {"base": "Animal", "fields": {"legs": {"type": "number", "default": 2}, "wings": "integer"}}
        }"#,
    );
    let bird = ty(&doc, "Bird");
    assert_eq!(
        field_summary(bird),
        vec![
            s("id", "Animal", "uuid"),
            s("name", "Animal", "string"),
            s("legs", "Bird", "number"),
            s("wings", "Bird", "integer"),
        ]
    );

    // inherited fields are the base's objects, not copies
    let animal_id = ty(&doc, "Animal").fields().and_then(|t| t.get("id")).cloned();
    let bird_id = bird.fields().and_then(|t| t.get("id")).cloned();
    assert!(matches!((animal_id, bird_id), (Some(a), Some(b)) if b.shares_field(&a)));

    // redeclaration drops every inherited attribute
    let legs = bird.fields().and_then(|t| t.get("legs")).cloned();
    assert_eq!(legs.and_then(|f| f.default.clone()), Some(json!(2)));
}

#[test]
fn test_union_later_member_wins_and_mixin_first_wins() {
    let doc = build(
        r#"{
            "Cat": {"fields": {"kind": "string", "meow": "boolean"}},
            "Dog": {"fields": {"kind": "integer", "bark": "boolean"}},
            "Pet": {"kind": "Union", "members": ["Cat", "Dog"]},
            "CatDog": {"kind": "Mixin", "mixins": ["Cat", "Dog"]}
        }"#,
    );
    assert_eq!(
        field_summary(ty(&doc, "Pet")),
        vec![
            s("kind", "Dog", "integer"),
            s("meow", "Cat", "boolean"),
            s("bark", "Dog", "boolean"),
        ]
    );

    let catdog = ty(&doc, "CatDog");
    assert_eq!(catdog.kind(), TypeKind::Complex);
    assert_eq!(
        field_summary(catdog),
        vec![
            s("kind", "Cat", "string"),
            s("meow", "Cat", "boolean"),
            s("bark", "Dog", "boolean"),
        ]
    );
    assert!(catdog.is_derived_from("dog"));
}

#[rstest]
#[case("forbid", "forbid", AdditionalFields::Forbid)]
#[case("forbid", "error", AdditionalFields::Error)]
#[case("error", "allow", AdditionalFields::Allow)]
fn test_union_additional_fields_priority(#[case] a: &str, #[case] b: &str, #[case] expected: AdditionalFields) {
    let doc = build(&format!(
        r#"{{
            "A": {{"additionalFields": "{a}"}},
            "B": {{"additionalFields": "{b}"}},
            "AB": {{"kind": "Union", "members": ["A", "B"]}}
        }}"#
    ));
    assert_eq!(ty(&doc, "AB").additional_fields(), expected);
}

#[test]
fn test_discriminator_is_inherited() {
    let doc = build(
        r#"{
            "Shape": {"discriminatorField": "type", "fields": {"type": "string"}},
            "Circle": {"base": "Shape", "discriminatorValue": "circle", "fields": {"radius": "number"}},
            "Square": {"base": "Shape", "discriminatorValue": "square", "fields": {"side": "number"}},
            "AnyShape": {"kind": "Union", "members": ["Circle", "Square"]}
        }"#,
    );
    let circle = ty(&doc, "Circle");
    assert_eq!(circle.discriminator_field(), Some("type"));
    assert_eq!(circle.discriminator_value(), Some(&json!("circle")));

    let member = ty(&doc, "AnyShape")
        .as_union()
        .and_then(|u| u.member_for_discriminator(&json!("square")))
        .map(|m| m.name().to_string());
    assert_eq!(member.as_deref(), Some("Square"));
}

#[test]
fn test_enum_extends_enum() {
    let doc = build(
        r#"{
            "Status": {"kind": "Enum", "values": ["open", "closed"]},
            "ExtStatus": {"kind": "Enum", "base": "Status", "values": [
                {"value": "closed", "description": "Finished"}, "archived"
            ]}
        }"#,
    );
    let Some(status) = ty(&doc, "ExtStatus").as_enum() else {
        panic!("expected enum");
    };
    assert_eq!(status.values.len(), 3);
    assert!(status.contains(&json!("open")));
    assert_eq!(
        status.get(&json!("closed")).and_then(|v| v.description.as_deref()),
        Some("Finished")
    );
}

#[test]
fn test_builder_api_matches_json() {
    let declared = DocumentDeclaration::new("shop")
        .with_type("Base", ComplexTypeDeclaration::new().with_field("id", FieldDeclaration::new("uuid").required()))
        .with_type(
            "Item",
            ComplexTypeDeclaration::new()
                .with_base("Base")
                .with_field("tags", FieldDeclaration::new("string").array()),
        )
        .with_type("Mixed", MixinTypeDeclaration::new(["Base", "Item"]))
        .with_type("Either", UnionTypeDeclaration::new(["Base", "Item"]))
        .with_type("Color", EnumTypeDeclaration::new(["red", "green"]));
    let loaded = DocumentDeclaration::from_json(
        r#"{"id": "shop", "types": {
            "Base": {"fields": {"id": {"type": "uuid", "required": true}}},
            "Item": {"extends": "Base", "fields": {"tags": {"type": "string", "isArray": true}}},
            "Mixed": {"kind": "Mixin", "mixins": ["Base", "Item"]},
            "Either": {"kind": "union", "members": ["Base", "Item"]},
            "Color": {"kind": "Enum", "values": ["red", "green"]}
        }}"#,
    )
    .unwrap();
    assert_eq!(declared, loaded);

    let doc = TypeDocument::build(&declared, &[]).unwrap();
    let kinds: Vec<_> = doc.types().map(|t| t.kind()).collect();
    assert_eq!(
        kinds,
        vec![TypeKind::Complex, TypeKind::Complex, TypeKind::Complex, TypeKind::Union, TypeKind::Enum]
    );
}

#[test]
fn test_document_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");
    let declaration = DocumentDeclaration::new("library")
        .with_type("Book", ComplexTypeDeclaration::new().with_field("title", FieldDeclaration::new("string").required()));
    std::fs::write(&path, serde_json::to_string_pretty(&declaration).unwrap()).unwrap();

    let loaded = DocumentDeclaration::from_json_file(&path).unwrap();
    assert_eq!(loaded, declaration);
}

#[rstest]
#[case(r#"{"A": {"kind": "Union", "members": ["B"]}, "B": {"kind": "Union", "members": ["A"]}}"#)]
#[case(r#"{"A": {"kind": "Mapped", "base": "A", "omit": []}}"#)]
#[case(r#"{"A": {"kind": "Mixin", "mixins": ["B"]}, "B": {"base": "A"}}"#)]
fn test_structural_cycles_fail(#[case] json: &str) {
    let err = TypeDocument::from_json(json).unwrap_err();
    assert!(matches!(err, SchemaError::CircularReference { .. }), "{err}");
}
