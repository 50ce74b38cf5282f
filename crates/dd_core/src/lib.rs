pub mod decode;
pub mod encode;
pub mod error;
pub mod files;
pub mod hash;
pub mod names;
pub mod reader;
pub mod tree;

pub use decode::{MAX_DEPTH, ResolvePolicy, decode};
pub use encode::encode;
pub use error::{DecodeError, DecodeErrorKind};
pub use hash::name_hash;
pub use names::NameDirectory;
pub use tree::{FieldKey, Node};

/// Magic bytes at the start of every container file.
pub const MAGIC: [u8; 4] = [0x01, 0xB1, 0x00, 0x00];

/// Container format version this codec reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// Sentinel prefix marking an unresolved hash in text form.
pub const HASH_SENTINEL: &str = "###";
