use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use mockseed_core::{
    Choice, Composite, CompositeRef, Container, Error, Field, FieldKind, Relation, SchemaCatalog,
    SchemaProvider, Value, validate_catalog,
};

fn load_fixture() -> SchemaCatalog {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/library.catalog.json");
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse catalog")
}

fn two_container_catalog() -> SchemaCatalog {
    SchemaCatalog::new(vec![
        Container::new(
            "blog",
            vec![
                Composite::new(
                    "Post",
                    vec![
                        Field::new("id", FieldKind::Auto).with_auto_created(),
                        Field::new("title", FieldKind::Char).with_max_length(64),
                        Field::new("tags", FieldKind::ManyToMany)
                            .with_relation(Relation::to_many("blog", "Tag")),
                        Field::new("body", FieldKind::Text),
                    ],
                ),
                Composite::new("Tag", vec![Field::new("label", FieldKind::Slug)]),
                Composite::new("Comment", vec![Field::new("text", FieldKind::Text)]),
            ],
        ),
        Container::new(
            "auth",
            vec![Composite::new(
                "User",
                vec![Field::new("email", FieldKind::Email).with_unique()],
            )],
        ),
    ])
}

#[test]
fn fixture_catalog_parses_and_validates() {
    let catalog = load_fixture();
    validate_catalog(&catalog).expect("fixture is consistent");

    let book = CompositeRef::new("library", "Book");
    let isbn = catalog
        .field_by_path("library.Book.isbn")
        .expect("isbn field");
    assert_eq!(isbn.kind, FieldKind::PositiveInteger);
    assert!(isbn.unique);

    let color = catalog
        .field_by_path("library.Bookmark.color")
        .expect("color field");
    assert_eq!(color.choices.len(), 3);
    assert_eq!(Value::from_json(&color.choices[0].value), Value::Int(1));

    let multi = catalog.multi_valued_fields(&book).expect("book m2m");
    assert_eq!(multi.len(), 1);
    assert_eq!(multi[0].name, "authors");
}

#[test]
fn unknown_kind_tags_round_trip() {
    let field: Field =
        serde_json::from_str(r#"{"name": "shape", "kind": "PolygonField"}"#).expect("parse field");
    assert_eq!(field.kind, FieldKind::Other("PolygonField".to_string()));

    let json = serde_json::to_value(&field).expect("serialize field");
    assert_eq!(json["kind"], "PolygonField");
    assert_eq!(FieldKind::from_tag("IPAddressField"), FieldKind::IpAddress);
}

#[test]
fn provider_keeps_declaration_order_and_splits_multi_valued_fields() {
    let catalog = two_container_catalog();
    assert_eq!(catalog.containers(), vec!["blog", "auth"]);

    let composites = catalog
        .composites("blog", &BTreeSet::new())
        .expect("blog composites");
    let names: Vec<&str> = composites.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Post", "Tag", "Comment"]);

    let post = CompositeRef::new("blog", "Post");
    let fields: Vec<String> = catalog
        .fields(&post)
        .expect("post fields")
        .into_iter()
        .map(|field| field.name)
        .collect();
    assert_eq!(fields, vec!["id", "title", "body"]);

    let multi = catalog.multi_valued_fields(&post).expect("post multi");
    assert_eq!(multi.len(), 1);
    assert!(multi[0].is_multi_valued());
}

#[test]
fn provider_drops_excluded_composites_case_insensitively() {
    let catalog = two_container_catalog();
    let excluded: BTreeSet<String> = ["blog.comment".to_string(), "blog.Missing".to_string()]
        .into_iter()
        .collect();

    let composites = catalog
        .composites("blog", &excluded)
        .expect("blog composites");
    assert!(composites.iter().all(|c| c.name != "Comment"));
    assert_eq!(composites.len(), 2);
}

#[test]
fn provider_rejects_unknown_container() {
    let catalog = two_container_catalog();
    let result = catalog.composites("shop", &BTreeSet::new());
    assert!(matches!(result, Err(Error::UnknownContainer(name)) if name == "shop"));
}

#[test]
fn validation_rejects_unknown_relation_target() {
    let catalog = SchemaCatalog::new(vec![Container::new(
        "blog",
        vec![Composite::new(
            "Post",
            vec![
                Field::new("author", FieldKind::ForeignKey)
                    .with_relation(Relation::to_one("auth", "User")),
            ],
        )],
    )]);

    let err = validate_catalog(&catalog).expect_err("missing target");
    assert!(matches!(err, Error::InvalidSchema(msg) if msg.contains("auth.User")));
}

#[test]
fn validation_rejects_duplicate_fields_and_kind_mismatch() {
    let duplicate = SchemaCatalog::new(vec![Container::new(
        "blog",
        vec![Composite::new(
            "Post",
            vec![
                Field::new("title", FieldKind::Char),
                Field::new("title", FieldKind::Text),
            ],
        )],
    )]);
    assert!(validate_catalog(&duplicate).is_err());

    let mismatch = SchemaCatalog::new(vec![Container::new(
        "blog",
        vec![
            Composite::new(
                "Post",
                vec![
                    Field::new("tags", FieldKind::ManyToMany)
                        .with_relation(Relation::to_one("blog", "Tag")),
                ],
            ),
            Composite::new("Tag", Vec::new()),
        ],
    )]);
    let err = validate_catalog(&mismatch).expect_err("kind mismatch");
    assert!(matches!(err, Error::InvalidSchema(msg) if msg.contains("single-valued")));
}

#[test]
fn choices_and_values_convert_from_plain_json() {
    let choice = Choice::new("draft", "Draft");
    assert_eq!(Value::from_json(&choice.value), Value::Text("draft".to_string()));
    assert_eq!(Value::from_json(&serde_json::json!(2.5)), Value::Float(2.5));
    assert_eq!(Value::from_json(&serde_json::Value::Null), Value::Null);
    assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
}
