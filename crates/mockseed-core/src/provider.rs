use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::{CompositeRef, Field, SchemaCatalog};

/// Source of schema metadata for the population engine.
///
/// Iteration order must be stable: engines walk containers, composites and
/// fields in the order returned here.
pub trait SchemaProvider {
    /// Every known container, in declaration order.
    fn containers(&self) -> Vec<String>;

    /// Composites registered under `container`, minus any whose qualified
    /// name appears in `excluded` (compared case-insensitively).
    fn composites(&self, container: &str, excluded: &BTreeSet<String>)
    -> Result<Vec<CompositeRef>>;

    /// Single-valued fields of a composite, in declaration order.
    fn fields(&self, composite: &CompositeRef) -> Result<Vec<Field>>;

    /// Multi-valued relation fields of a composite, in declaration order.
    fn multi_valued_fields(&self, composite: &CompositeRef) -> Result<Vec<Field>>;
}

impl SchemaProvider for SchemaCatalog {
    fn containers(&self) -> Vec<String> {
        self.containers
            .iter()
            .map(|container| container.name.clone())
            .collect()
    }

    fn composites(
        &self,
        container: &str,
        excluded: &BTreeSet<String>,
    ) -> Result<Vec<CompositeRef>> {
        let entry = self
            .container(container)
            .ok_or_else(|| Error::UnknownContainer(container.to_string()))?;

        Ok(entry
            .composites
            .iter()
            .map(|composite| CompositeRef::new(&entry.name, &composite.name))
            .filter(|composite| !excluded.iter().any(|name| composite.matches(name)))
            .collect())
    }

    fn fields(&self, composite: &CompositeRef) -> Result<Vec<Field>> {
        let entry = self
            .composite(composite)
            .ok_or_else(|| Error::UnknownComposite(composite.qualified()))?;
        Ok(entry
            .fields
            .iter()
            .filter(|field| !field.is_multi_valued())
            .cloned()
            .collect())
    }

    fn multi_valued_fields(&self, composite: &CompositeRef) -> Result<Vec<Field>> {
        let entry = self
            .composite(composite)
            .ok_or_else(|| Error::UnknownComposite(composite.qualified()))?;
        Ok(entry
            .fields
            .iter()
            .filter(|field| field.is_multi_valued())
            .cloned()
            .collect())
    }
}
