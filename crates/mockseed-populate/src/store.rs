use std::collections::BTreeMap;

use mockseed_core::{
    CompositeRef, Error, Filter, PersistenceBackend, Record, RecordId, Result, Value,
};

/// Backend call recorded by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Begin,
    Commit,
    Rollback,
    Persist {
        composite: CompositeRef,
        id: RecordId,
    },
    AddToRelation {
        composite: CompositeRef,
        id: RecordId,
        field: String,
        count: usize,
    },
}

#[derive(Debug, Default)]
struct Staged {
    records: BTreeMap<CompositeRef, Vec<Record>>,
    next_id_at_begin: u64,
}

/// In-memory transactional store.
///
/// Writes go to a staged set opened by `begin`; `commit` moves them to the
/// committed set and `rollback` drops them. Reads see committed records
/// followed by staged ones.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    committed: BTreeMap<CompositeRef, Vec<Record>>,
    staged: Option<Staged>,
    next_id: u64,
    journal: Vec<JournalEntry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record outside of any transaction, as if written by an earlier run.
    pub fn preload(
        &mut self,
        composite: &CompositeRef,
        values: BTreeMap<String, Value>,
    ) -> RecordId {
        let id = self.allocate_id();
        let mut record = Record::new(composite.clone());
        record.id = Some(id);
        record.values = values;
        self.committed
            .entry(composite.clone())
            .or_default()
            .push(record);
        id
    }

    /// Committed records of one composite.
    pub fn records(&self, composite: &CompositeRef) -> &[Record] {
        self.committed
            .get(composite)
            .map(|records| records.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_records(&self) -> impl Iterator<Item = &Record> {
        self.committed.values().flatten()
    }

    pub fn record_count(&self) -> usize {
        self.committed.values().map(Vec::len).sum()
    }

    pub fn in_transaction(&self) -> bool {
        self.staged.is_some()
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId::new(self.next_id)
    }

    fn staged_mut(&mut self, operation: &str) -> Result<&mut Staged> {
        self.staged
            .as_mut()
            .ok_or_else(|| Error::Transaction(format!("{operation} outside of a transaction")))
    }

    fn visible(&self, composite: &CompositeRef) -> impl Iterator<Item = &Record> {
        let staged = self
            .staged
            .as_ref()
            .and_then(|staged| staged.records.get(composite))
            .into_iter()
            .flatten();
        self.committed
            .get(composite)
            .into_iter()
            .flatten()
            .chain(staged)
    }
}

impl PersistenceBackend for MemoryBackend {
    fn construct(&mut self, composite: &CompositeRef) -> Result<Record> {
        self.staged_mut("construct")?;
        Ok(Record::new(composite.clone()))
    }

    fn set_attribute(&mut self, record: &mut Record, field: &str, value: Value) -> Result<()> {
        self.staged_mut("set_attribute")?;
        record.values.insert(field.to_string(), value);
        Ok(())
    }

    fn add_to_relation(
        &mut self,
        record: &mut Record,
        field: &str,
        values: &[RecordId],
    ) -> Result<()> {
        let id = record.id.ok_or_else(|| {
            Error::Backend(format!(
                "{}.{field}: relation rows need a persisted record",
                record.composite
            ))
        })?;
        let staged = self.staged_mut("add_to_relation")?;
        let stored = staged
            .records
            .get_mut(&record.composite)
            .and_then(|records| records.iter_mut().find(|stored| stored.id == Some(id)))
            .ok_or_else(|| {
                Error::Backend(format!(
                    "{} #{id} was not persisted in this transaction",
                    record.composite
                ))
            })?;

        for target in values {
            let related = record.relations.entry(field.to_string()).or_default();
            if !related.contains(target) {
                related.push(*target);
            }
        }
        stored.relations = record.relations.clone();

        self.journal.push(JournalEntry::AddToRelation {
            composite: record.composite.clone(),
            id,
            field: field.to_string(),
            count: values.len(),
        });
        Ok(())
    }

    fn persist(&mut self, record: &mut Record) -> Result<RecordId> {
        self.staged_mut("persist")?;
        if record.is_persisted() {
            return Err(Error::Backend(format!(
                "{} is already persisted",
                record.composite
            )));
        }
        let id = self.allocate_id();
        record.id = Some(id);
        let staged = self.staged_mut("persist")?;
        staged
            .records
            .entry(record.composite.clone())
            .or_default()
            .push(record.clone());
        self.journal.push(JournalEntry::Persist {
            composite: record.composite.clone(),
            id,
        });
        Ok(id)
    }

    fn exists_with_value(
        &self,
        composite: &CompositeRef,
        field: &str,
        value: &Value,
    ) -> Result<bool> {
        Ok(self
            .visible(composite)
            .any(|record| record.get(field) == Some(value)))
    }

    fn find_ids(&self, composite: &CompositeRef, filter: &Filter) -> Result<Vec<RecordId>> {
        Ok(self
            .visible(composite)
            .filter(|record| {
                filter
                    .iter()
                    .all(|(field, expected)| record.get(field) == Some(expected))
            })
            .filter_map(|record| record.id)
            .collect())
    }

    fn begin(&mut self) -> Result<()> {
        if self.staged.is_some() {
            return Err(Error::Transaction(
                "a transaction is already open".to_string(),
            ));
        }
        self.staged = Some(Staged {
            records: BTreeMap::new(),
            next_id_at_begin: self.next_id,
        });
        self.journal.push(JournalEntry::Begin);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let staged = self
            .staged
            .take()
            .ok_or_else(|| Error::Transaction("commit without a transaction".to_string()))?;
        for (composite, records) in staged.records {
            self.committed.entry(composite).or_default().extend(records);
        }
        self.journal.push(JournalEntry::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let staged = self
            .staged
            .take()
            .ok_or_else(|| Error::Transaction("rollback without a transaction".to_string()))?;
        self.next_id = staged.next_id_at_begin;
        self.journal.push(JournalEntry::Rollback);
        Ok(())
    }
}
