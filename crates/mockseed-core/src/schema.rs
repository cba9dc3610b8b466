use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{Choice, FieldKind};

/// Top-level schema snapshot: every container the engine can populate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchemaCatalog {
    /// Contract version for this catalog format.
    pub catalog_version: String,
    /// Containers in declaration order.
    pub containers: Vec<Container>,
}

/// A named grouping of composites.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Container {
    pub name: String,
    pub composites: Vec<Composite>,
}

/// A record type with named, typed fields.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Composite {
    pub name: String,
    pub fields: Vec<Field>,
}

/// Field metadata for a composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Optional field: may be left unset.
    #[serde(default)]
    pub blank: bool,
    /// The stored value may be null.
    #[serde(default)]
    pub null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
    /// Fixed set of allowed values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// System managed (primary keys and similar); never populated.
    #[serde(default)]
    pub auto_created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            blank: false,
            null: false,
            unique: false,
            max_length: None,
            decimal_places: None,
            choices: Vec::new(),
            auto_created: false,
            relation: None,
        }
    }

    pub fn with_blank(mut self) -> Self {
        self.blank = true;
        self
    }

    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn with_auto_created(mut self) -> Self {
        self.auto_created = true;
        self
    }

    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    pub fn is_multi_valued(&self) -> bool {
        self.kind == FieldKind::ManyToMany
            || self.relation.as_ref().is_some_and(|relation| relation.many)
    }

    pub fn is_system(&self) -> bool {
        self.auto_created || self.kind == FieldKind::Auto
    }
}

/// Reference from a field to another composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Relation {
    pub container: String,
    pub composite: String,
    /// Multi-valued relation (filled after the owner is persisted).
    #[serde(default)]
    pub many: bool,
    /// Equality filter applied when picking related records.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limit_to: BTreeMap<String, serde_json::Value>,
}

impl Relation {
    pub fn to_one(container: impl Into<String>, composite: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            composite: composite.into(),
            many: false,
            limit_to: BTreeMap::new(),
        }
    }

    pub fn to_many(container: impl Into<String>, composite: impl Into<String>) -> Self {
        Self {
            many: true,
            ..Self::to_one(container, composite)
        }
    }

    pub fn target(&self) -> CompositeRef {
        CompositeRef::new(&self.container, &self.composite)
    }
}

/// Qualified identity of a composite (`container.Composite`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeRef {
    pub container: String,
    pub name: String,
}

impl CompositeRef {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.container, self.name)
    }

    /// Case-insensitive match against a `container.Composite` name.
    pub fn matches(&self, qualified: &str) -> bool {
        qualified.eq_ignore_ascii_case(&self.qualified())
    }

    /// Fully-qualified path of one of this composite's fields.
    pub fn field_path(&self, field: &str) -> String {
        format!("{}.{}.{}", self.container, self.name, field)
    }
}

impl fmt::Display for CompositeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.container, self.name)
    }
}

impl SchemaCatalog {
    pub fn new(containers: Vec<Container>) -> Self {
        Self {
            catalog_version: crate::CATALOG_VERSION.to_string(),
            containers,
        }
    }

    pub fn container(&self, name: &str) -> Option<&Container> {
        self.containers
            .iter()
            .find(|container| container.name == name)
    }

    pub fn composite(&self, composite: &CompositeRef) -> Option<&Composite> {
        self.container(&composite.container)?
            .composites
            .iter()
            .find(|candidate| candidate.name == composite.name)
    }

    /// Look up a composite by case-insensitive `container.Composite` name.
    pub fn find_qualified(&self, qualified: &str) -> Option<CompositeRef> {
        self.containers.iter().find_map(|container| {
            container
                .composites
                .iter()
                .map(|composite| CompositeRef::new(&container.name, &composite.name))
                .find(|candidate| candidate.matches(qualified))
        })
    }

    /// Look up a field by exact `container.Composite.field` path.
    pub fn field_by_path(&self, path: &str) -> Option<&Field> {
        let mut parts = path.splitn(3, '.');
        let container = parts.next()?;
        let composite = parts.next()?;
        let field = parts.next()?;
        self.composite(&CompositeRef::new(container, composite))?
            .fields
            .iter()
            .find(|candidate| candidate.name == field)
    }
}

impl Container {
    pub fn new(name: impl Into<String>, composites: Vec<Composite>) -> Self {
        Self {
            name: name.into(),
            composites,
        }
    }
}

impl Composite {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}
