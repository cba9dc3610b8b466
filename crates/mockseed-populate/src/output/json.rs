use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value as JsonValue};

use mockseed_core::Record;

use crate::errors::PopulateError;

/// Records grouped by `container.Composite`, each rendered as a JSON object
/// with its `id`, attribute values and relation id lists.
pub fn records_snapshot<'a>(records: impl IntoIterator<Item = &'a Record>) -> JsonValue {
    let mut grouped: BTreeMap<String, Vec<JsonValue>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.composite.qualified())
            .or_default()
            .push(record_json(record));
    }
    JsonValue::Object(
        grouped
            .into_iter()
            .map(|(composite, rows)| (composite, JsonValue::Array(rows)))
            .collect(),
    )
}

pub fn write_records_json<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a Record>,
) -> Result<(), PopulateError> {
    let snapshot = records_snapshot(records);
    std::fs::write(path, serde_json::to_vec_pretty(&snapshot)?)?;
    Ok(())
}

fn record_json(record: &Record) -> JsonValue {
    let mut object = Map::new();
    object.insert(
        "id".to_string(),
        record
            .id
            .map(|id| JsonValue::from(id.get()))
            .unwrap_or(JsonValue::Null),
    );
    for (field, value) in &record.values {
        object.insert(field.clone(), value.to_json());
    }
    for (field, ids) in &record.relations {
        object.insert(
            field.clone(),
            JsonValue::Array(ids.iter().map(|id| JsonValue::from(id.get())).collect()),
        );
    }
    JsonValue::Object(object)
}
