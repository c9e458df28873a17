use indexmap::IndexMap;

use crate::tree::NodeId;

/// A value held by a declared field.
///
/// `List` and `Map` are the plain containers the injection walk scans
/// structurally; `Bytes` is a flat binary payload and is never walked;
/// `Node` is a nested observable node by construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<FieldValue>),
    Map(IndexMap<String, FieldValue>),
    Node(NodeId),
}

impl FieldValue {
    /// Flat binary payloads are leaves: they never contain nested nodes.
    pub fn is_binary_leaf(&self) -> bool {
        matches!(self, FieldValue::Bytes(_))
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            FieldValue::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(v: Vec<FieldValue>) -> Self {
        FieldValue::List(v)
    }
}

impl From<IndexMap<String, FieldValue>> for FieldValue {
    fn from(v: IndexMap<String, FieldValue>) -> Self {
        FieldValue::Map(v)
    }
}

impl From<NodeId> for FieldValue {
    fn from(v: NodeId) -> Self {
        FieldValue::Node(v)
    }
}
