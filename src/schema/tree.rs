//! Schema tree construction.
//!
//! # Responsibilities
//! - Turn a type's static descriptors into a tree of `Node`s
//! - Drop fields annotated with `skip`
//! - Compile field patterns once, at build time
//!
//! # Design Decisions
//! - Built once per configuration type, read-only afterwards
//! - The root must be a record; lists of lists are rejected
//! - No cross-field validation happens here

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::path::Path;
use crate::schema::describe::{Describe, FieldDescriptor, FieldMeta, Shape, ValueType};

/// Errors raised while building a schema. All of them are setup-fatal.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("configuration root must be a record, found {0}")]
    NotARecord(&'static str),

    #[error("field '{0}' is a list of lists, which cannot be edited as a form")]
    NestedList(String),

    #[error("field '{field}' has an invalid pattern: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Element kind of a list node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Primitive(ValueType),
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Primitive(ValueType),
    Record,
    List(ElementKind),
}

/// A node of the schema tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub meta: FieldMeta,
    /// Fields of a record, or of each element of a list of records.
    pub children: Vec<Node>,
    /// Element node of a list of primitives.
    element: Option<Box<Node>>,
    pattern: Option<Regex>,
}

impl Node {
    fn build(descriptor: &FieldDescriptor, path: &Path) -> Result<Self, SchemaError> {
        let pattern = compile_pattern(&descriptor.meta, path)?;
        let name = descriptor.name.to_string();
        let meta = descriptor.meta.clone();

        let node = match &descriptor.shape {
            Shape::Scalar(value_type) => Node {
                name,
                kind: NodeKind::Primitive(*value_type),
                meta,
                children: Vec::new(),
                element: None,
                pattern,
            },
            Shape::Record(fields) => Node {
                name,
                kind: NodeKind::Record,
                meta,
                children: build_children(fields, path)?,
                element: None,
                pattern,
            },
            Shape::List(element) => match element.as_ref() {
                Shape::Record(fields) => Node {
                    name,
                    kind: NodeKind::List(ElementKind::Record),
                    meta,
                    children: build_children(fields, path)?,
                    element: None,
                    pattern,
                },
                Shape::Scalar(value_type) => {
                    let item = Node {
                        name: name.clone(),
                        kind: NodeKind::Primitive(*value_type),
                        meta: meta.clone(),
                        children: Vec::new(),
                        element: None,
                        pattern: pattern.clone(),
                    };
                    Node {
                        name,
                        kind: NodeKind::List(ElementKind::Primitive(*value_type)),
                        meta,
                        children: Vec::new(),
                        element: Some(Box::new(item)),
                        pattern,
                    }
                }
                Shape::List(_) => return Err(SchemaError::NestedList(path.to_string())),
            },
        };

        Ok(node)
    }

    /// The element node of a list of primitives.
    pub fn element(&self) -> Option<&Node> {
        self.element.as_deref()
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Compiled `pattern` constraint, if any.
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn value_type(&self) -> Option<ValueType> {
        match self.kind {
            NodeKind::Primitive(t) | NodeKind::List(ElementKind::Primitive(t)) => Some(t),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, NodeKind::List(_))
    }

    /// Human-facing label: the `label` annotation, else the wire name.
    pub fn label(&self) -> &str {
        self.meta.label.as_deref().unwrap_or(&self.name)
    }
}

fn build_children(fields: &[FieldDescriptor], parent: &Path) -> Result<Vec<Node>, SchemaError> {
    fields
        .iter()
        .filter(|f| !f.meta.skip)
        .map(|f| {
            let path = if parent.is_root() {
                Path::new(f.name)
            } else {
                parent.child(f.name)
            };
            Node::build(f, &path)
        })
        .collect()
}

fn compile_pattern(meta: &FieldMeta, path: &Path) -> Result<Option<Regex>, SchemaError> {
    match &meta.pattern {
        Some(pattern) => Regex::new(&format!("^(?:{})$", pattern))
            .map(Some)
            .map_err(|source| SchemaError::Pattern {
                field: path.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// The schema tree of a configuration type.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Node>,
}

impl Schema {
    /// Build the tree for `T`, which must describe itself as a record.
    pub fn of<T: Describe>() -> Result<Self, SchemaError> {
        Self::from_shape(&T::shape())
    }

    pub fn from_shape(shape: &Shape) -> Result<Self, SchemaError> {
        match shape {
            Shape::Record(fields) => {
                let fields = build_children(fields, &Path::root())?;
                tracing::debug!(fields = fields.len(), "Schema tree built");
                Ok(Self { fields })
            }
            Shape::Scalar(_) => Err(SchemaError::NotARecord("a scalar")),
            Shape::List(_) => Err(SchemaError::NotARecord("a list")),
        }
    }

    /// Top-level fields in declaration order.
    pub fn fields(&self) -> &[Node] {
        &self.fields
    }

    /// Locate the node addressed by `path`. Indices are ignored; a path
    /// ending in an index on a primitive list resolves to its element node.
    pub fn node_at(&self, path: &Path) -> Option<&Node> {
        let mut nodes = &self.fields;
        let mut found: Option<&Node> = None;

        for segment in path.iter() {
            let node = nodes.iter().find(|n| n.name == segment.name)?;
            found = Some(match (segment.index, node.element()) {
                (Some(_), Some(element)) => element,
                _ => node,
            });
            nodes = &node.children;
        }

        found
    }
}
