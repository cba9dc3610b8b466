mod logging;
mod run;

pub use logging::init_logging;
pub use run::{RunContext, RunPaths, start_run, write_composite_csvs, write_records, write_report};

use thiserror::Error;

/// Errors raised while writing run artifacts.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export error: {0}")]
    Export(#[from] mockseed_populate::PopulateError),
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
