use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, Result};

pub const DEFAULT_CYCLES: u32 = 1;
pub const DEFAULT_UNIQUE_ATTEMPTS: u32 = 5;

/// Population run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PopulateConfig {
    /// Containers to populate, in traversal order.
    pub containers: Vec<String>,
    /// Number of full passes over every container.
    #[serde(default = "default_cycles")]
    pub cycles: u32,
    /// Flip a fair coin for optional fields and leave them unset on "skip".
    #[serde(default = "default_true")]
    pub use_coin_toss: bool,
    /// `container.Composite` names to leave out of the walk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_composites: Vec<String>,
    /// Bundled handler packs applied after the defaults, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handler_packs: Vec<String>,
    /// Constant values for exact `container.Composite.field` paths.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub strict_values: BTreeMap<String, serde_json::Value>,
    /// Seed for reproducible runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Generation attempts for unique fields before accepting a collision.
    #[serde(default = "default_unique_attempts")]
    pub unique_attempts: u32,
}

impl PopulateConfig {
    pub fn new(containers: Vec<String>) -> Self {
        Self {
            containers,
            cycles: DEFAULT_CYCLES,
            use_coin_toss: true,
            excluded_composites: Vec::new(),
            handler_packs: Vec::new(),
            strict_values: BTreeMap::new(),
            seed: None,
            unique_attempts: DEFAULT_UNIQUE_ATTEMPTS,
        }
    }
}

fn default_cycles() -> u32 {
    DEFAULT_CYCLES
}

fn default_true() -> bool {
    true
}

fn default_unique_attempts() -> u32 {
    DEFAULT_UNIQUE_ATTEMPTS
}

pub fn parse_toml(contents: &str) -> Result<PopulateConfig> {
    Ok(toml::from_str(contents)?)
}

pub fn parse_json(contents: &str) -> Result<PopulateConfig> {
    Ok(serde_json::from_str(contents)?)
}

/// Load a config file, picking the format from its extension.
pub fn load_config(path: &Path) -> Result<PopulateConfig> {
    let contents = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => parse_toml(&contents),
        Some("json") => parse_json(&contents),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}
