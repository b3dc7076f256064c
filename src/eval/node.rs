//! Loaded document values

use indexmap::IndexMap;
use serde_json::Value;

/// A value produced by a loader
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Node>),
    Record(Box<RecordInstance>),
    /// Untyped content accepted by the `Any` loader
    Any(Value),
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordInstance> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// A validated record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInstance {
    pub class_name: String,
    /// Present fields by member name, in declaration order
    pub fields: IndexMap<String, Node>,
    /// Namespaced keys kept verbatim, keyed by expanded URI
    pub extension_fields: IndexMap<String, Value>,
    /// Namespaces in effect when the record was loaded
    pub namespaces: IndexMap<String, String>,
    pub schemas: Vec<String>,
}

impl RecordInstance {
    pub fn get(&self, field: &str) -> Option<&Node> {
        self.fields.get(field)
    }

    /// String value of a field, if it holds one
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Node::as_str)
    }
}
