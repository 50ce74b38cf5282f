use tracing::debug;

use crate::error::{DecodeError, DecodeErrorKind};
use crate::names::NameDirectory;
use crate::reader::SliceReader;
use crate::tree::{FieldKey, Node};
use crate::{FORMAT_VERSION, MAGIC};

pub(crate) const TAG_INT: u8 = 0x01;
pub(crate) const TAG_FLOAT: u8 = 0x02;
pub(crate) const TAG_BOOL: u8 = 0x03;
pub(crate) const TAG_STRING: u8 = 0x04;
pub(crate) const TAG_HASH_REF: u8 = 0x05;
pub(crate) const TAG_OBJECT: u8 = 0x06;
pub(crate) const TAG_ARRAY: u8 = 0x07;

/// Deepest container nesting the decoder will walk. Recursion is bounded
/// so a small, structurally valid buffer of nested composites cannot
/// blow the stack; past the limit decoding fails like any other corrupt
/// input.
pub const MAX_DEPTH: usize = 128;

/// How to surface a hashed field key whose name may be known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolvePolicy {
    /// Resolve through the directory when known, else keep the numeric
    /// placeholder.
    #[default]
    ResolveKnown,
    /// Keep every key numeric, ignoring the directory. Useful for
    /// diffing two saves independently of what names happen to be known.
    KeepNumeric,
}

/// Decode a container buffer into a Structural Tree.
///
/// Fail-fast: the first structurally invalid byte sequence aborts the
/// whole decode with the absolute offset of the failure. No partial
/// tree is ever returned.
pub fn decode(
    bytes: &[u8],
    directory: &NameDirectory,
    policy: ResolvePolicy,
) -> Result<Node, DecodeError> {
    let mut r = SliceReader::new(bytes);

    let magic = r.read_bytes(MAGIC.len()).map_err(|_| eof_magic(bytes))?;
    if magic != MAGIC.as_slice() {
        return Err(DecodeError::new(0, DecodeErrorKind::BadMagic));
    }
    let version_offset = r.position();
    let version = r.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(DecodeError::new(
            version_offset,
            DecodeErrorKind::UnsupportedVersion(version),
        ));
    }

    let root = decode_value(&mut r, directory, policy, 0)?;
    if !r.is_at_end() {
        return Err(DecodeError::new(
            r.position(),
            DecodeErrorKind::TrailingBytes(r.remaining()),
        ));
    }

    debug!(
        len = bytes.len(),
        children = root.child_count(),
        "decoded container"
    );
    Ok(root)
}

fn eof_magic(bytes: &[u8]) -> DecodeError {
    // A buffer too short to even hold the magic is reported as bad magic
    // rather than a bare EOF; callers show one message for "not a save".
    DecodeError::new(bytes.len().min(MAGIC.len() - 1), DecodeErrorKind::BadMagic)
}

fn decode_value(
    r: &mut SliceReader<'_>,
    directory: &NameDirectory,
    policy: ResolvePolicy,
    depth: usize,
) -> Result<Node, DecodeError> {
    let tag_offset = r.position();
    let tag = r.read_u8()?;
    if depth >= MAX_DEPTH && matches!(tag, TAG_OBJECT | TAG_ARRAY) {
        return Err(DecodeError::new(
            tag_offset,
            DecodeErrorKind::TooDeep { limit: MAX_DEPTH },
        ));
    }
    match tag {
        TAG_INT => Ok(Node::Int(r.read_i32()?)),
        TAG_FLOAT => Ok(Node::Float(r.read_f32()?)),
        TAG_BOOL => {
            let byte_offset = r.position();
            match r.read_u8()? {
                0 => Ok(Node::Bool(false)),
                1 => Ok(Node::Bool(true)),
                other => Err(DecodeError::new(
                    byte_offset,
                    DecodeErrorKind::InvalidBool(other),
                )),
            }
        }
        TAG_STRING => {
            let len_offset = r.position();
            let len = r.read_u32()? as usize;
            if len > r.remaining() {
                return Err(DecodeError::new(
                    len_offset,
                    DecodeErrorKind::LengthOverrun {
                        length: len,
                        remaining: r.remaining(),
                    },
                ));
            }
            let data_offset = r.position();
            let raw = r.read_bytes(len)?;
            let text = std::str::from_utf8(raw)
                .map_err(|_| DecodeError::new(data_offset, DecodeErrorKind::InvalidUtf8))?;
            Ok(Node::String(text.to_string()))
        }
        TAG_HASH_REF => Ok(Node::HashRef(r.read_u32()?)),
        TAG_OBJECT => {
            let (count, extent_end) = read_composite_header(r)?;
            let mut fields = Vec::with_capacity(clamped_capacity(count));
            for _ in 0..count {
                let hash = r.read_u32()?;
                let key = resolve_key(hash, directory, policy);
                let value = decode_value(r, directory, policy, depth + 1)?;
                fields.push((key, value));
            }
            check_extent(r, extent_end)?;
            Ok(Node::Object(fields))
        }
        TAG_ARRAY => {
            let (count, extent_end) = read_composite_header(r)?;
            let mut items = Vec::with_capacity(clamped_capacity(count));
            for _ in 0..count {
                items.push(decode_value(r, directory, policy, depth + 1)?);
            }
            check_extent(r, extent_end)?;
            Ok(Node::Array(items))
        }
        other => Err(DecodeError::new(
            tag_offset,
            DecodeErrorKind::UnknownTag(other),
        )),
    }
}

/// Read an (extent, count) composite header, validating the extent
/// against the remaining buffer. Returns the count and the absolute
/// offset the cursor must land on after walking the body.
fn read_composite_header(r: &mut SliceReader<'_>) -> Result<(u32, usize), DecodeError> {
    let extent_offset = r.position();
    let extent = r.read_u32()? as usize;
    if extent > r.remaining() {
        return Err(DecodeError::new(
            extent_offset,
            DecodeErrorKind::LengthOverrun {
                length: extent,
                remaining: r.remaining(),
            },
        ));
    }
    let extent_end = r.position() + extent;
    let count = r.read_u32()?;
    Ok((count, extent_end))
}

fn check_extent(r: &SliceReader<'_>, extent_end: usize) -> Result<(), DecodeError> {
    if r.position() != extent_end {
        // Walked size disagrees with the declared extent; report at the
        // end of the walk so the offset points into the corrupt value.
        return Err(DecodeError::new(
            r.position(),
            DecodeErrorKind::ExtentMismatch {
                declared_end: extent_end,
                actual_end: r.position(),
            },
        ));
    }
    Ok(())
}

fn resolve_key(hash: u32, directory: &NameDirectory, policy: ResolvePolicy) -> FieldKey {
    match policy {
        ResolvePolicy::ResolveKnown => match directory.resolve(hash) {
            Some(name) => FieldKey::Name(name),
            None => FieldKey::Unresolved(hash),
        },
        ResolvePolicy::KeepNumeric => FieldKey::Unresolved(hash),
    }
}

/// Counts come from the wire; don't let a hostile buffer preallocate
/// gigabytes before the element reads fail.
fn clamped_capacity(count: u32) -> usize {
    (count as usize).min(4096)
}
