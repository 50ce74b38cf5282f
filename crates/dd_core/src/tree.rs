use crate::hash::name_hash;

/// A field key inside an object: either a name recovered through the
/// Name Directory, or the raw hash when no name is known.
///
/// Both views encode back to the same `u32`; an unresolved key restores
/// its original hash bit-for-bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    Name(String),
    Unresolved(u32),
}

impl FieldKey {
    /// The hash this key serializes to.
    pub fn hash(&self) -> u32 {
        match self {
            FieldKey::Name(name) => name_hash(name),
            FieldKey::Unresolved(hash) => *hash,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            FieldKey::Name(name) => Some(name),
            FieldKey::Unresolved(_) => None,
        }
    }
}

/// In-memory value model shared by decode, render, parse, and encode.
///
/// Object field order and array element order are significant and
/// preserved verbatim; re-ordering would change the encoded bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(Vec<(FieldKey, Node)>),
    Array(Vec<Node>),
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    /// An integer that is itself a hash of some (possibly unknown) name.
    HashRef(u32),
}

impl Node {
    pub fn object() -> Node {
        Node::Object(Vec::new())
    }

    /// First field with the given resolved name, if any.
    pub fn get(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Object(fields) => fields
                .iter()
                .find(|(key, _)| key.name() == Some(name))
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        match self {
            Node::Object(fields) => fields
                .iter_mut()
                .find(|(key, _)| key.name() == Some(name))
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Node::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Number of direct children (fields or elements); 0 for scalars.
    pub fn child_count(&self) -> usize {
        match self {
            Node::Object(fields) => fields.len(),
            Node::Array(items) => items.len(),
            _ => 0,
        }
    }
}
