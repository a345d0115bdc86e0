//! Structural schemas derived from declared types.
//!
//! A [`SchemaNode`] describes the shape of a value independently of any
//! instance. Schemas are produced by [`translate`](translate::translate) from
//! a [`TypeDecl`](decl::TypeDecl) and rendered to a JSON-Schema-flavoured
//! document for hashing and for shipping to a sink.

pub mod decl;
pub mod translate;

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// The kinds of scalar a [`SchemaNode::Primitive`] can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Any,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Any => "any",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recursively defined structural description of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// A scalar, optionally tagged with the declaration it was derived from.
    Primitive {
        kind: PrimitiveKind,
        tag: Option<String>,
    },
    /// A homogeneous sequence. `None` items means unconstrained.
    Array { items: Option<Box<SchemaNode>> },
    /// A key/value mapping or an opaque named type.
    Object {
        additional: Option<Box<SchemaNode>>,
        tag: Option<String>,
    },
    /// A fixed-length heterogeneous sequence.
    Tuple { items: Vec<SchemaNode> },
    /// One of several shapes, in declaration order, without duplicates.
    Union { options: Vec<SchemaNode> },
    /// `inner` or null.
    Nullable(Box<SchemaNode>),
    /// A structured record with named fields.
    Record {
        title: Option<String>,
        properties: Vec<(String, SchemaNode)>,
        required: BTreeSet<String>,
    },
}

impl SchemaNode {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        SchemaNode::Primitive { kind, tag: None }
    }

    pub fn any() -> Self {
        SchemaNode::primitive(PrimitiveKind::Any)
    }

    pub fn string() -> Self {
        SchemaNode::primitive(PrimitiveKind::String)
    }

    pub fn integer() -> Self {
        SchemaNode::primitive(PrimitiveKind::Integer)
    }

    pub fn number() -> Self {
        SchemaNode::primitive(PrimitiveKind::Number)
    }

    pub fn boolean() -> Self {
        SchemaNode::primitive(PrimitiveKind::Boolean)
    }

    pub fn null() -> Self {
        SchemaNode::primitive(PrimitiveKind::Null)
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Some(Box::new(items)),
        }
    }

    pub fn tagged_object(tag: impl Into<String>) -> Self {
        SchemaNode::Object {
            additional: None,
            tag: Some(tag.into()),
        }
    }

    /// Marks `inner` as nullable. Already-nullable nodes are returned as is.
    pub fn nullable(inner: SchemaNode) -> Self {
        match inner {
            SchemaNode::Nullable(_) => inner,
            other => SchemaNode::Nullable(Box::new(other)),
        }
    }

    /// Starts an untitled record with no properties.
    pub fn record() -> Self {
        SchemaNode::Record {
            title: None,
            properties: Vec::new(),
            required: BTreeSet::new(),
        }
    }

    /// Adds a property to a record. Non-record nodes are returned unchanged.
    pub fn property(mut self, name: impl Into<String>, node: SchemaNode, required: bool) -> Self {
        if let SchemaNode::Record {
            properties,
            required: req,
            ..
        } = &mut self
        {
            let name = name.into();
            if required {
                req.insert(name.clone());
            }
            properties.push((name, node));
        }
        self
    }

    pub fn is_record(&self) -> bool {
        matches!(self, SchemaNode::Record { .. })
    }

    pub fn is_union(&self) -> bool {
        matches!(self, SchemaNode::Union { .. })
    }

    /// Looks up a record property by name, through a nullable wrapper.
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Nullable(inner) => inner.get(name),
            SchemaNode::Record { properties, .. } => properties
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Whether `name` is in the record's required set.
    pub fn requires(&self, name: &str) -> bool {
        match self {
            SchemaNode::Nullable(inner) => inner.requires(name),
            SchemaNode::Record { required, .. } => required.contains(name),
            _ => false,
        }
    }

    /// Renders the schema as a JSON-Schema-flavoured document.
    pub fn to_json(&self) -> Value {
        match self {
            SchemaNode::Primitive { kind, tag } => {
                let mut doc = json!({ "type": kind.as_str() });
                if let Some(tag) = tag {
                    doc["description"] = Value::String(tag.clone());
                }
                doc
            }
            SchemaNode::Array { items } => {
                let mut doc = json!({ "type": "array" });
                if let Some(items) = items {
                    doc["items"] = items.to_json();
                }
                doc
            }
            SchemaNode::Object { additional, tag } => {
                let mut doc = json!({ "type": "object" });
                if let Some(additional) = additional {
                    doc["additionalProperties"] = additional.to_json();
                }
                if let Some(tag) = tag {
                    doc["description"] = Value::String(tag.clone());
                }
                doc
            }
            SchemaNode::Tuple { items } => json!({
                "type": "array",
                "items": items.iter().map(SchemaNode::to_json).collect::<Vec<_>>(),
                "minItems": items.len(),
                "maxItems": items.len(),
            }),
            SchemaNode::Union { options } => json!({
                "anyOf": options.iter().map(SchemaNode::to_json).collect::<Vec<_>>(),
            }),
            SchemaNode::Nullable(inner) => {
                let mut doc = inner.to_json();
                if let Value::Object(map) = &mut doc {
                    map.insert("nullable".to_string(), Value::Bool(true));
                }
                doc
            }
            SchemaNode::Record {
                title,
                properties,
                required,
            } => {
                let mut props = Map::new();
                for (name, node) in properties {
                    props.insert(name.clone(), node.to_json());
                }
                let mut doc = json!({ "type": "object", "properties": props });
                if let Some(title) = title {
                    doc["title"] = Value::String(title.clone());
                }
                if !required.is_empty() {
                    doc["required"] = json!(required.iter().collect::<Vec<_>>());
                }
                doc
            }
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
