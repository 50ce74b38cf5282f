pub mod parse;
pub mod render;
pub mod session;

pub use parse::{ParseError, ParseErrorKind, parse};
pub use render::render;
pub use session::EditSession;
