use std::collections::BTreeMap;

use crate::error::Result;
use crate::record::{Record, RecordId};
use crate::schema::CompositeRef;
use crate::types::Value;

/// Equality filter over record attributes.
pub type Filter = BTreeMap<String, Value>;

/// Storage the population engine writes through.
///
/// All writes of one run happen between `begin` and `commit`/`rollback`.
/// Reads (`exists_with_value`, `find_ids`) must observe the records staged by
/// the current transaction.
pub trait PersistenceBackend {
    /// Build a fresh, not yet persisted instance of a composite.
    fn construct(&mut self, composite: &CompositeRef) -> Result<Record>;

    fn set_attribute(&mut self, record: &mut Record, field: &str, value: Value) -> Result<()>;

    /// Associate related records with an already persisted record.
    fn add_to_relation(&mut self, record: &mut Record, field: &str, values: &[RecordId])
    -> Result<()>;

    /// Store the record and return its assigned identity.
    fn persist(&mut self, record: &mut Record) -> Result<RecordId>;

    fn exists_with_value(&self, composite: &CompositeRef, field: &str, value: &Value)
    -> Result<bool>;

    /// Identities of stored records of `composite` matching every filter entry.
    fn find_ids(&self, composite: &CompositeRef, filter: &Filter) -> Result<Vec<RecordId>>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;
}
