use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// Declared kind of a field.
///
/// Serialized as its tag string (`CharField`, `ForeignKey`, ...). The tag is
/// also the key for kind-level ("global") handlers, so unknown tags survive
/// a round trip as [`FieldKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Auto,
    Char,
    Text,
    Slug,
    Email,
    IpAddress,
    Boolean,
    Integer,
    PositiveInteger,
    Decimal,
    Float,
    Date,
    DateTime,
    ForeignKey,
    ManyToMany,
    Other(String),
}

impl FieldKind {
    /// Tag used in catalogs and as the global handler key.
    pub fn tag(&self) -> &str {
        match self {
            FieldKind::Auto => "AutoField",
            FieldKind::Char => "CharField",
            FieldKind::Text => "TextField",
            FieldKind::Slug => "SlugField",
            FieldKind::Email => "EmailField",
            FieldKind::IpAddress => "IPAddressField",
            FieldKind::Boolean => "BooleanField",
            FieldKind::Integer => "IntegerField",
            FieldKind::PositiveInteger => "PositiveIntegerField",
            FieldKind::Decimal => "DecimalField",
            FieldKind::Float => "FloatField",
            FieldKind::Date => "DateField",
            FieldKind::DateTime => "DateTimeField",
            FieldKind::ForeignKey => "ForeignKey",
            FieldKind::ManyToMany => "ManyToManyField",
            FieldKind::Other(tag) => tag.as_str(),
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "AutoField" => FieldKind::Auto,
            "CharField" => FieldKind::Char,
            "TextField" => FieldKind::Text,
            "SlugField" => FieldKind::Slug,
            "EmailField" => FieldKind::Email,
            "IPAddressField" => FieldKind::IpAddress,
            "BooleanField" => FieldKind::Boolean,
            "IntegerField" => FieldKind::Integer,
            "PositiveIntegerField" => FieldKind::PositiveInteger,
            "DecimalField" => FieldKind::Decimal,
            "FloatField" => FieldKind::Float,
            "DateField" => FieldKind::Date,
            "DateTimeField" => FieldKind::DateTime,
            "ForeignKey" => FieldKind::ForeignKey,
            "ManyToManyField" => FieldKind::ManyToMany,
            other => FieldKind::Other(other.to_string()),
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, FieldKind::ForeignKey | FieldKind::ManyToMany)
    }
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        FieldKind::from_tag(&value)
    }
}

impl From<FieldKind> for String {
    fn from(value: FieldKind) -> Self {
        value.tag().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl JsonSchema for FieldKind {
    fn schema_name() -> String {
        "FieldKind".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        <String as JsonSchema>::json_schema(generator)
    }
}

/// One allowed value of a fixed-choice field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Choice {
    /// Stored value.
    pub value: serde_json::Value,
    /// Human readable label.
    #[serde(default)]
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<serde_json::Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Value assigned to a record attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Reference to one related record.
    Ref(RecordId),
    /// References for a multi-valued relation.
    Refs(Vec<RecordId>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Ref(_) => "ref",
            Value::Refs(_) => "refs",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Convert a plain JSON value (catalog choices, config constants, relation
    /// filters) into a record value.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(*value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => Value::Int(value),
                None => Value::Float(number.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(value) => Value::Text(value.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    /// Render the value for JSON export.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Int(value) => serde_json::Value::from(*value),
            Value::Float(value) => serde_json::Value::from(*value),
            Value::Text(value) => serde_json::Value::String(value.clone()),
            Value::Date(value) => serde_json::Value::String(value.format("%Y-%m-%d").to_string()),
            Value::DateTime(value) => {
                serde_json::Value::String(value.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            Value::Ref(id) => serde_json::Value::from(id.get()),
            Value::Refs(ids) => {
                serde_json::Value::Array(ids.iter().map(|id| id.get().into()).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
            Value::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Value::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S")),
            Value::Ref(id) => write!(f, "{id}"),
            Value::Refs(ids) => {
                let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                f.write_str(&joined.join(";"))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}
