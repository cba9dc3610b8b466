use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::PopulateConfig;

/// Emit the JSON Schema for population config files.
pub fn config_json_schema() -> RootSchema {
    schema_for!(PopulateConfig)
}
