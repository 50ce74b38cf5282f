use thiserror::Error;

/// Failure while decoding a container buffer.
///
/// Carries the absolute byte offset of the first structurally invalid
/// byte sequence. Decoding is fail-fast: one error, no partial tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}")]
pub struct DecodeError {
    pub offset: usize,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        Self { offset, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    #[error("bad magic bytes, not a save container")]
    BadMagic,
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u32),
    #[error("unexpected end of buffer, needed {needed} more byte(s)")]
    UnexpectedEof { needed: usize },
    #[error("unknown value tag 0x{0:02x}")]
    UnknownTag(u8),
    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBool(u8),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("length {length} exceeds {remaining} remaining byte(s)")]
    LengthOverrun { length: usize, remaining: usize },
    #[error("composite extent mismatch: declared end {declared_end}, walked to {actual_end}")]
    ExtentMismatch {
        declared_end: usize,
        actual_end: usize,
    },
    #[error("{0} trailing byte(s) after root value")]
    TrailingBytes(usize),
    #[error("nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
}
