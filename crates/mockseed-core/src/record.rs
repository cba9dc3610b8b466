use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::CompositeRef;
use crate::types::Value;

/// Identity assigned to a record when it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An in-progress or stored instance of a composite.
///
/// `id` stays `None` until the backend persists the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub composite: CompositeRef,
    pub id: Option<RecordId>,
    pub values: BTreeMap<String, Value>,
    pub relations: BTreeMap<String, Vec<RecordId>>,
}

impl Record {
    pub fn new(composite: CompositeRef) -> Self {
        Self {
            composite,
            id: None,
            values: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn related(&self, field: &str) -> &[RecordId] {
        self.relations
            .get(field)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }
}
