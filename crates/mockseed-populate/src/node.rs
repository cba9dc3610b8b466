use std::fmt;

use mockseed_core::{CompositeRef, Field, Record};

/// A field of a composite, as seen by handlers.
#[derive(Debug, Clone, Copy)]
pub struct FieldNode<'a> {
    pub composite: &'a CompositeRef,
    pub field: &'a Field,
}

impl<'a> FieldNode<'a> {
    pub fn new(composite: &'a CompositeRef, field: &'a Field) -> Self {
        Self { composite, field }
    }

    /// Fully-qualified `container.Composite.field` path.
    pub fn path(&self) -> String {
        self.composite.field_path(&self.field.name)
    }
}

/// Position of the walk in the container -> composite -> field hierarchy.
///
/// Field variants always carry their composite, so a field can never be
/// visited outside of one. The instance is borrowed from the composite visit
/// that constructed it.
#[derive(Debug)]
pub enum SchemaNode<'a> {
    Container(&'a str),
    Composite(&'a CompositeRef),
    ScalarField {
        node: FieldNode<'a>,
        instance: &'a mut Record,
    },
    MultiRelationField {
        node: FieldNode<'a>,
        instance: &'a mut Record,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Composite,
    ScalarField,
    MultiRelationField,
}

impl SchemaNode<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            SchemaNode::Container(_) => NodeKind::Container,
            SchemaNode::Composite(_) => NodeKind::Composite,
            SchemaNode::ScalarField { .. } => NodeKind::ScalarField,
            SchemaNode::MultiRelationField { .. } => NodeKind::MultiRelationField,
        }
    }

    pub fn container(&self) -> &str {
        match self {
            SchemaNode::Container(name) => name,
            SchemaNode::Composite(composite) => &composite.container,
            SchemaNode::ScalarField { node, .. } | SchemaNode::MultiRelationField { node, .. } => {
                &node.composite.container
            }
        }
    }

    pub fn composite(&self) -> Option<&CompositeRef> {
        match self {
            SchemaNode::Container(_) => None,
            SchemaNode::Composite(composite) => Some(composite),
            SchemaNode::ScalarField { node, .. } | SchemaNode::MultiRelationField { node, .. } => {
                Some(node.composite)
            }
        }
    }

    pub fn field(&self) -> Option<&Field> {
        match self {
            SchemaNode::ScalarField { node, .. } | SchemaNode::MultiRelationField { node, .. } => {
                Some(node.field)
            }
            _ => None,
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, SchemaNode::MultiRelationField { .. })
    }
}

impl fmt::Display for SchemaNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaNode::Container(name) => f.write_str(name),
            SchemaNode::Composite(composite) => write!(f, "{composite}"),
            SchemaNode::ScalarField { node, .. } | SchemaNode::MultiRelationField { node, .. } => {
                f.write_str(&node.path())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockseed_core::{FieldKind, Relation};

    use super::*;

    #[test]
    fn field_nodes_carry_their_composite() {
        let book = CompositeRef::new("library", "Book");
        let title = Field::new("title", FieldKind::Char);
        let mut record = Record::new(book.clone());

        let node = SchemaNode::ScalarField {
            node: FieldNode::new(&book, &title),
            instance: &mut record,
        };
        assert_eq!(node.kind(), NodeKind::ScalarField);
        assert_eq!(node.container(), "library");
        assert_eq!(node.composite(), Some(&book));
        assert_eq!(node.to_string(), "library.Book.title");
        assert!(!node.is_multi_valued());
    }

    #[test]
    fn multi_relation_nodes_report_multi_valued() {
        let book = CompositeRef::new("library", "Book");
        let authors = Field::new("authors", FieldKind::ManyToMany)
            .with_relation(Relation::to_many("library", "Author"));
        let mut record = Record::new(book.clone());

        let node = SchemaNode::MultiRelationField {
            node: FieldNode::new(&book, &authors),
            instance: &mut record,
        };
        assert!(node.is_multi_valued());
        assert_eq!(node.field().map(|field| field.name.as_str()), Some("authors"));

        let container = SchemaNode::Container("library");
        assert_eq!(container.kind(), NodeKind::Container);
        assert!(container.composite().is_none());
        assert!(container.field().is_none());
    }
}
