use std::collections::HashSet;
use std::sync::LazyLock;

use jsonschema::JSONSchema;
use mockseed_core::{CompositeRef, SchemaCatalog};
use regex::Regex;
use serde_json::Value;

use crate::errors::{ConfigError, ValidationIssue, ValidationReport};
use crate::model::PopulateConfig;

static COMPOSITE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex literal")
});

static FIELD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*$")
        .expect("valid regex literal")
});

/// Validate a config JSON document against the config JSON Schema.
pub fn validate_config_json(
    config_json: &Value,
    config_schema: &Value,
) -> Result<ValidationReport, ConfigError> {
    let compiled =
        JSONSchema::compile(config_schema).map_err(|err| ConfigError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(config_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Check a parsed config on its own, without a catalog.
pub fn validate_config(config: &PopulateConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_containers(config, &mut report);

    if config.cycles == 0 {
        report.push(ValidationIssue::error(
            "cycles_zero",
            "/cycles",
            "cycles must be greater than zero",
            Some("set cycles to a positive integer".to_string()),
        ));
    }

    if config.unique_attempts == 0 {
        report.push(ValidationIssue::error(
            "unique_attempts_zero",
            "/unique_attempts",
            "unique_attempts must be greater than zero",
            None,
        ));
    }

    for (idx, name) in config.excluded_composites.iter().enumerate() {
        if !COMPOSITE_NAME.is_match(name) {
            report.push(ValidationIssue::error(
                "invalid_composite_name",
                format!("/excluded_composites/{idx}"),
                format!("'{name}' is not a 'container.Composite' name"),
                None,
            ));
        }
    }

    let mut packs = HashSet::new();
    for (idx, pack) in config.handler_packs.iter().enumerate() {
        let path = format!("/handler_packs/{idx}");
        if pack == "defaults" {
            report.push(ValidationIssue::warning(
                "redundant_default_pack",
                path,
                "the defaults pack is always applied first",
                Some("remove 'defaults' from handler_packs".to_string()),
            ));
        } else if !packs.insert(pack.as_str()) {
            report.push(ValidationIssue::warning(
                "duplicate_handler_pack",
                path,
                format!("handler pack '{pack}' listed more than once"),
                None,
            ));
        }
    }

    for path in config.strict_values.keys() {
        if !FIELD_PATH.is_match(path) {
            report.push(ValidationIssue::error(
                "invalid_field_path",
                format!("/strict_values/{path}"),
                format!("'{path}' is not a 'container.Composite.field' path"),
                None,
            ));
        }
    }

    report
}

/// Validate a config against the catalog it will run on.
pub fn validate_config_against_catalog(
    config: &PopulateConfig,
    catalog: &SchemaCatalog,
) -> ValidationReport {
    let mut report = validate_config(config);

    for (idx, container) in config.containers.iter().enumerate() {
        if catalog.container(container).is_none() {
            report.push(ValidationIssue::error(
                "unknown_container",
                format!("/containers/{idx}"),
                format!("container '{container}' not found in catalog"),
                None,
            ));
        }
    }

    let mut excluded = Vec::new();
    for (idx, name) in config.excluded_composites.iter().enumerate() {
        match catalog.find_qualified(name) {
            Some(composite) => excluded.push(composite),
            None => report.push(ValidationIssue::warning(
                "unknown_excluded_composite",
                format!("/excluded_composites/{idx}"),
                format!("composite '{name}' not found in catalog; exclusion has no effect"),
                None,
            )),
        }
    }

    validate_excluded_targets(config, catalog, &excluded, &mut report);

    for (path, value) in &config.strict_values {
        let pointer = format!("/strict_values/{path}");
        match catalog.field_by_path(path) {
            None => report.push(ValidationIssue::warning(
                "unknown_field_path",
                pointer,
                format!("field '{path}' not found in catalog; strict value is never used"),
                None,
            )),
            Some(field) if field.has_choices() => report.push(ValidationIssue::warning(
                "strict_value_on_choice_field",
                pointer,
                format!("field '{path}' has fixed choices, which take priority over {value}"),
                Some("remove the strict value or the choices".to_string()),
            )),
            Some(field) if field.is_system() => report.push(ValidationIssue::warning(
                "strict_value_on_system_field",
                pointer,
                format!("field '{path}' is system managed and never populated"),
                None,
            )),
            Some(field) => {
                if let Some(relation) = &field.relation {
                    if !is_record_id_value(value, relation.many) {
                        let expected = if relation.many {
                            "a record id or a list of record ids"
                        } else {
                            "a record id"
                        };
                        report.push(ValidationIssue::error(
                            "strict_value_on_relation_field",
                            pointer,
                            format!(
                                "field '{path}' relates to {}; {value} is not {expected}",
                                relation.target()
                            ),
                            None,
                        ));
                    }
                }
            }
        }
    }

    report
}

fn validate_containers(config: &PopulateConfig, report: &mut ValidationReport) {
    if config.containers.is_empty() {
        report.push(ValidationIssue::error(
            "containers_empty",
            "/containers",
            "config requires at least one container",
            Some("list the containers to populate".to_string()),
        ));
        return;
    }

    let mut seen = HashSet::new();
    for (idx, container) in config.containers.iter().enumerate() {
        if !seen.insert(container.as_str()) {
            report.push(ValidationIssue::error(
                "duplicate_container",
                format!("/containers/{idx}"),
                format!("container '{container}' listed more than once"),
                Some("remove the duplicate entry".to_string()),
            ));
        }
    }
}

// Relations that point into an excluded composite only find records that
// already exist in storage.
fn validate_excluded_targets(
    config: &PopulateConfig,
    catalog: &SchemaCatalog,
    excluded: &[CompositeRef],
    report: &mut ValidationReport,
) {
    if excluded.is_empty() {
        return;
    }

    for container in &catalog.containers {
        if !config.containers.contains(&container.name) {
            continue;
        }
        for composite in &container.composites {
            let source = CompositeRef::new(&container.name, &composite.name);
            if excluded.contains(&source) {
                continue;
            }
            for field in &composite.fields {
                let Some(relation) = &field.relation else {
                    continue;
                };
                if excluded.contains(&relation.target()) {
                    report.push(ValidationIssue::warning(
                        "excluded_relation_target",
                        "/excluded_composites",
                        format!(
                            "{} points at excluded composite {}",
                            source.field_path(&field.name),
                            relation.target()
                        ),
                        Some("make sure the target already has stored records".to_string()),
                    ));
                }
            }
        }
    }
}

fn is_record_id_value(value: &Value, many: bool) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) if many => items.iter().all(Value::is_u64),
        other => other.is_u64(),
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
