use thiserror::Error;

/// Errors emitted by the population engine.
///
/// Any of these raised during a walk aborts the run and rolls back every
/// write made by it. Per-field problems that the engine can live with are
/// reported as [`crate::model::PopulateIssue`]s instead.
#[derive(Debug, Error)]
pub enum PopulateError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("schema error: {0}")]
    Schema(#[from] mockseed_core::Error),
    #[error("handler failed for {path}: {message}")]
    Handler { path: String, message: String },
    #[error("population panicked: {0}")]
    Panicked(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl PopulateError {
    pub fn handler(path: impl Into<String>, message: impl Into<String>) -> Self {
        PopulateError::Handler {
            path: path.into(),
            message: message.into(),
        }
    }
}
