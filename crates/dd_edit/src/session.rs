use std::sync::Arc;

use dd_core::{DecodeError, NameDirectory, Node, ResolvePolicy, decode, encode};
use tracing::debug;

use crate::parse::{ParseError, parse};
use crate::render::render;

/// One file's decode -> edit -> re-encode lifecycle.
///
/// The session owns its Structural Tree exclusively; the only shared
/// state is the injected Name Directory, which is read-mostly. Encoding
/// happens only through [`EditSession::commit`], which parses first — an
/// edit that fails to parse can never reach the encoder.
#[derive(Debug)]
pub struct EditSession {
    directory: Arc<NameDirectory>,
    policy: ResolvePolicy,
    tree: Option<Node>,
}

impl EditSession {
    pub fn new(directory: Arc<NameDirectory>) -> Self {
        Self::with_policy(directory, ResolvePolicy::ResolveKnown)
    }

    pub fn with_policy(directory: Arc<NameDirectory>, policy: ResolvePolicy) -> Self {
        Self {
            directory,
            policy,
            tree: None,
        }
    }

    /// Decode container bytes and return their editable text form.
    ///
    /// On failure the session keeps whatever it held before; partial
    /// decodes are discarded by the decoder itself.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<String, DecodeError> {
        let tree = decode(bytes, &self.directory, self.policy)?;
        let text = render(&tree);
        debug!(bytes = bytes.len(), chars = text.len(), "loaded container into session");
        self.tree = Some(tree);
        Ok(text)
    }

    /// Check edited text without changing session state.
    pub fn validate_edit(&self, text: &str) -> Result<(), ParseError> {
        parse(text).map(|_| ())
    }

    /// Parse edited text, adopt it as the session tree, and encode it.
    pub fn commit(&mut self, text: &str) -> Result<Vec<u8>, ParseError> {
        let tree = parse(text)?;
        let bytes = encode(&tree);
        debug!(chars = text.len(), bytes = bytes.len(), "committed edit");
        self.tree = Some(tree);
        Ok(bytes)
    }

    pub fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    pub fn tree(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    /// Re-render the current tree, if one is loaded.
    pub fn current_text(&self) -> Option<String> {
        self.tree.as_ref().map(render)
    }

    pub fn directory(&self) -> &Arc<NameDirectory> {
        &self.directory
    }
}
