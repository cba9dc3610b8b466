//! Core contracts and helpers for mockseed.
//!
//! This crate defines the schema catalog (containers, composites, fields),
//! the record data model, and the provider/backend traits that the
//! population engine walks and writes through.

pub mod backend;
pub mod error;
pub mod provider;
pub mod record;
pub mod schema;
pub mod types;
pub mod validation;

pub use backend::{Filter, PersistenceBackend};
pub use error::{Error, Result};
pub use provider::SchemaProvider;
pub use record::{Record, RecordId};
pub use schema::{Composite, CompositeRef, Container, Field, Relation, SchemaCatalog};
pub use types::{Choice, FieldKind, Value};
pub use validation::validate_catalog;

/// Current contract version for `catalog.json` artifacts.
pub const CATALOG_VERSION: &str = "0.1";
