use crate::decode::{
    TAG_ARRAY, TAG_BOOL, TAG_FLOAT, TAG_HASH_REF, TAG_INT, TAG_OBJECT, TAG_STRING,
};
use crate::tree::Node;
use crate::{FORMAT_VERSION, MAGIC};

/// Serialize a Structural Tree back into container bytes.
///
/// Field and element order is emitted exactly as stored in the tree;
/// resolved keys hash through `name_hash`, unresolved keys restore their
/// original hash bit-for-bit. Encoding is total over trees: a tree that
/// exists is encodable, so this cannot fail.
pub fn encode(tree: &Node) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    emit_value(tree, &mut out);
    out
}

fn emit_value(node: &Node, out: &mut Vec<u8>) {
    match node {
        Node::Int(v) => {
            out.push(TAG_INT);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Node::Float(v) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Node::Bool(v) => {
            out.push(TAG_BOOL);
            out.push(u8::from(*v));
        }
        Node::String(s) => {
            out.push(TAG_STRING);
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Node::HashRef(hash) => {
            out.push(TAG_HASH_REF);
            out.extend_from_slice(&hash.to_le_bytes());
        }
        Node::Object(fields) => {
            out.push(TAG_OBJECT);
            let extent_at = reserve_extent(out);
            out.extend_from_slice(&(fields.len() as u32).to_le_bytes());
            for (key, value) in fields {
                out.extend_from_slice(&key.hash().to_le_bytes());
                emit_value(value, out);
            }
            patch_extent(out, extent_at);
        }
        Node::Array(items) => {
            out.push(TAG_ARRAY);
            let extent_at = reserve_extent(out);
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                emit_value(item, out);
            }
            patch_extent(out, extent_at);
        }
    }
}

fn reserve_extent(out: &mut Vec<u8>) -> usize {
    let at = out.len();
    out.extend_from_slice(&[0u8; 4]);
    at
}

/// Fill a reserved extent slot with the number of bytes emitted after it.
fn patch_extent(out: &mut [u8], extent_at: usize) {
    let extent = (out.len() - extent_at - 4) as u32;
    out[extent_at..extent_at + 4].copy_from_slice(&extent.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::encode;
    use crate::tree::{FieldKey, Node};
    use crate::{FORMAT_VERSION, MAGIC};

    #[test]
    fn scalar_encodings_are_fixed_width() {
        let bytes = encode(&Node::Int(-2));
        assert_eq!(&bytes[..4], &MAGIC);
        assert_eq!(&bytes[4..8], &FORMAT_VERSION.to_le_bytes());
        assert_eq!(&bytes[8..], &[0x01, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn empty_object_has_zero_count_and_four_byte_extent() {
        let bytes = encode(&Node::object());
        // tag, extent=4 (just the count word), count=0
        assert_eq!(&bytes[8..], &[0x06, 4, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn unresolved_key_restores_hash_bytes() {
        let tree = Node::Object(vec![(FieldKey::Unresolved(0xDEAD_BEEF), Node::Bool(true))]);
        let bytes = encode(&tree);
        // key hash sits right after tag + extent + count
        assert_eq!(&bytes[8 + 1 + 4 + 4..8 + 1 + 4 + 4 + 4], &0xDEAD_BEEFu32.to_le_bytes());
    }
}
