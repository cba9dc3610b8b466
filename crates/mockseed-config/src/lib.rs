//! Population config contracts and validation.

pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{ConfigError, IssueSeverity, Result, ValidationIssue, ValidationReport};
pub use model::{
    DEFAULT_CYCLES, DEFAULT_UNIQUE_ATTEMPTS, PopulateConfig, load_config, parse_json, parse_toml,
};
pub use schema::config_json_schema;
pub use validate::{validate_config, validate_config_against_catalog, validate_config_json};
