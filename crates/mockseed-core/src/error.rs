use thiserror::Error;

/// Core error type shared across mockseed crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A container was requested that the schema provider does not know.
    #[error("unknown container: {0}")]
    UnknownContainer(String),
    /// A composite was requested that the schema provider does not know.
    #[error("unknown composite: {0}")]
    UnknownComposite(String),
    /// The catalog violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The persistence backend rejected an operation.
    #[error("backend error: {0}")]
    Backend(String),
    /// Transaction misuse (commit without begin, nested begin, ...).
    #[error("transaction error: {0}")]
    Transaction(String),
}

/// Convenience alias for results returned by mockseed crates.
pub type Result<T> = std::result::Result<T, Error>;
