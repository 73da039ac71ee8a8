//! Wire grammar constants.
//!
//! Peers must agree on prefix and separator byte-for-byte.

use serde::Deserialize;

use crate::error::{Result, WsMuxError};

/// Prefix shared with existing deployments of this frame grammar.
pub const DEFAULT_PREFIX: &str = "iris-websocket-message:";
/// Separator between event, tag and payload.
pub const DEFAULT_SEPARATOR: char = ';';

/// How a `Boolean` frame body is turned back into a `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolDecoding {
    /// Any non-empty body is `true` (string truthiness). `"false"` decodes as `true`.
    #[default]
    Truthy,
    /// Only the usual spellings (`1 t T TRUE true True`, `0 f F FALSE false False`);
    /// anything else is a malformed frame.
    Literal,
}

/// Immutable prefix/separator pair plus decode policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFormat {
    prefix: String,
    separator: char,
    bool_decoding: BoolDecoding,
}

impl Default for WireFormat {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            separator: DEFAULT_SEPARATOR,
            bool_decoding: BoolDecoding::default(),
        }
    }
}

impl WireFormat {
    /// Build a wire format. The separator must be a single ASCII punctuation
    /// character that does not occur in the prefix.
    pub fn new(prefix: impl Into<String>, separator: char) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(WsMuxError::InvalidWireFormat("prefix must not be empty".into()));
        }
        if !separator.is_ascii_punctuation() {
            return Err(WsMuxError::InvalidWireFormat(format!(
                "separator must be one ASCII punctuation character, got {separator:?}"
            )));
        }
        if prefix.contains(separator) {
            return Err(WsMuxError::InvalidWireFormat(format!(
                "separator {separator:?} must not appear in prefix {prefix:?}"
            )));
        }
        Ok(Self {
            prefix,
            separator,
            bool_decoding: BoolDecoding::default(),
        })
    }

    /// Replace the boolean decode policy.
    pub fn with_bool_decoding(mut self, mode: BoolDecoding) -> Self {
        self.bool_decoding = mode;
        self
    }

    /// Marker every frame starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Delimiter between event, tag and body.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Active boolean decode policy.
    pub fn bool_decoding(&self) -> BoolDecoding {
        self.bool_decoding
    }

    /// Byte length of `PREFIX event SEP tag SEP` for `event`.
    ///
    /// The trailing `+ 2` is one tag digit plus the separator after it: the
    /// grammar has no length field for the tag, so it is always one character.
    pub fn header_len(&self, event: &str) -> usize {
        self.prefix.len() + self.separator.len_utf8() + event.len() + 2
    }

    /// Event names must be non-empty and must not contain the separator.
    pub fn validate_event(&self, event: &str) -> Result<()> {
        if event.is_empty() {
            return Err(WsMuxError::InvalidEvent(event.to_string()));
        }
        if event.contains(self.separator) {
            return Err(WsMuxError::InvalidEvent(event.to_string()));
        }
        Ok(())
    }
}
