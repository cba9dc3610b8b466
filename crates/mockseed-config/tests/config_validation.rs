use std::fs;
use std::path::Path;

use mockseed_config::{
    ConfigError, PopulateConfig, config_json_schema, load_config, parse_json, parse_toml,
    validate_config, validate_config_against_catalog, validate_config_json,
};
use mockseed_core::SchemaCatalog;
use serde_json::json;

fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

fn load_catalog() -> SchemaCatalog {
    let path = fixture_path("library.catalog.json");
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse catalog")
}

#[test]
fn fixture_config_validates_against_fixture_catalog() {
    let config = load_config(&fixture_path("library.populate.toml")).expect("load config");
    assert_eq!(config.containers, vec!["library"]);
    assert_eq!(config.cycles, 3);
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.unique_attempts, 5);

    let report = validate_config_against_catalog(&config, &load_catalog());
    assert!(report.is_ok(), "unexpected errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
}

#[test]
fn defaults_apply_when_options_are_omitted() {
    let config = parse_toml(r#"containers = ["library"]"#).expect("parse toml");
    assert_eq!(config, PopulateConfig::new(vec!["library".to_string()]));
    assert!(config.use_coin_toss);
    assert_eq!(config.cycles, 1);
}

#[test]
fn missing_containers_and_zero_cycles_are_errors() {
    let config = parse_json(r#"{"containers": [], "cycles": 0}"#).expect("parse json");
    let report = validate_config(&config);
    assert!(!report.is_ok());
    assert!(report.has_code("containers_empty"));
    assert!(report.has_code("cycles_zero"));
}

#[test]
fn unknown_keys_are_rejected_while_parsing() {
    let result = parse_toml("containers = [\"library\"]\nuse_coin = false\n");
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn catalog_checks_report_unknown_names() {
    let mut config = PopulateConfig::new(vec!["library".to_string(), "shop".to_string()]);
    config.excluded_composites = vec!["library.Missing".to_string(), "not-a-name".to_string()];
    config
        .strict_values
        .insert("library.Book.subtitle".to_string(), json!("x"));
    config
        .strict_values
        .insert("library.Bookmark.color".to_string(), json!(9));

    let report = validate_config_against_catalog(&config, &load_catalog());
    assert!(report.has_code("unknown_container"));
    assert!(report.has_code("invalid_composite_name"));
    assert!(report.has_code("unknown_excluded_composite"));
    assert!(report.has_code("unknown_field_path"));
    assert!(report.has_code("strict_value_on_choice_field"));
}

#[test]
fn excluding_a_relation_target_is_flagged() {
    let mut config = PopulateConfig::new(vec!["library".to_string()]);
    config.excluded_composites = vec!["library.book".to_string()];

    let report = validate_config_against_catalog(&config, &load_catalog());
    assert!(report.is_ok());
    let flagged: Vec<&str> = report
        .warnings
        .iter()
        .filter(|issue| issue.code == "excluded_relation_target")
        .map(|issue| issue.message.as_str())
        .collect();
    assert_eq!(flagged.len(), 3, "shelf, bookmark and chapter point at Book");
}

#[test]
fn json_schema_flags_structural_problems() {
    let schema = serde_json::to_value(config_json_schema()).expect("serialize schema");

    let valid = json!({"containers": ["library"], "cycles": 2});
    let report = validate_config_json(&valid, &schema).expect("compile schema");
    assert!(report.is_ok());

    let invalid = json!({"containers": "library", "cycles": "two"});
    let report = validate_config_json(&invalid, &schema).expect("compile schema");
    assert!(!report.is_ok());
    assert!(report.errors.iter().all(|issue| issue.code == "schema_violation"));
}

#[test]
fn relation_constants_must_be_record_ids() {
    let mut config = PopulateConfig::new(vec!["library".to_string()]);
    config
        .strict_values
        .insert("library.Chapter.book".to_string(), json!(1));
    config
        .strict_values
        .insert("library.Book.authors".to_string(), json!([1, 2]));
    let report = validate_config_against_catalog(&config, &load_catalog());
    assert!(report.is_ok());
    assert!(!report.has_code("strict_value_on_relation_field"));

    config
        .strict_values
        .insert("library.Shelf.book".to_string(), json!([1]));
    config
        .strict_values
        .insert("library.Book.authors".to_string(), json!("Ada"));
    let report = validate_config_against_catalog(&config, &load_catalog());
    let flagged: Vec<&str> = report
        .errors
        .iter()
        .filter(|issue| issue.code == "strict_value_on_relation_field")
        .map(|issue| issue.path.as_str())
        .collect();
    assert_eq!(
        flagged,
        vec!["/strict_values/library.Book.authors", "/strict_values/library.Shelf.book"]
    );
}
