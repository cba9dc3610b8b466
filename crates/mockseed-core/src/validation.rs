use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::SchemaCatalog;
use crate::types::FieldKind;

/// Validate internal consistency of a schema catalog.
///
/// This checks:
/// - duplicate containers/composites/fields
/// - relation fields carry a relation and point at a known composite
/// - relation multiplicity agrees with the declared kind
pub fn validate_catalog(catalog: &SchemaCatalog) -> Result<()> {
    let mut index: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for container in &catalog.containers {
        if index.contains_key(container.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate container name: {}",
                container.name
            )));
        }

        let mut composites = BTreeSet::new();
        for composite in &container.composites {
            if !composites.insert(composite.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate composite name: {}.{}",
                    container.name, composite.name
                )));
            }

            let mut fields = BTreeSet::new();
            for field in &composite.fields {
                if !fields.insert(field.name.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate field name: {}.{}.{}",
                        container.name, composite.name, field.name
                    )));
                }
            }
        }

        index.insert(container.name.as_str(), composites);
    }

    for container in &catalog.containers {
        for composite in &container.composites {
            for field in &composite.fields {
                let path = format!("{}.{}.{}", container.name, composite.name, field.name);
                let Some(relation) = &field.relation else {
                    if field.kind.is_relation() {
                        return Err(Error::InvalidSchema(format!(
                            "relation field without target: {path}"
                        )));
                    }
                    continue;
                };

                let known = index
                    .get(relation.container.as_str())
                    .is_some_and(|composites| composites.contains(relation.composite.as_str()));
                if !known {
                    return Err(Error::InvalidSchema(format!(
                        "relation target not found: {path} -> {}.{}",
                        relation.container, relation.composite
                    )));
                }

                match field.kind {
                    FieldKind::ForeignKey if relation.many => {
                        return Err(Error::InvalidSchema(format!(
                            "foreign key declared as multi-valued: {path}"
                        )));
                    }
                    FieldKind::ManyToMany if !relation.many => {
                        return Err(Error::InvalidSchema(format!(
                            "many-to-many field declared as single-valued: {path}"
                        )));
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
