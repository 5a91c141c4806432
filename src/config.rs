//! Decoder and listing options.

use crate::strings::FALLBACK_LANGUAGE;

/// Knobs for [`decode_file_with`](crate::decode_file_with).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest scope nesting accepted before a forms package is abandoned.
    pub max_scope_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_scope_depth: 256,
        }
    }
}

/// Knobs for [`render_listing`](crate::listing::render_listing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingOptions {
    /// Language tried first when resolving string ids.
    pub language: String,
    /// Prefix each line with the absolute byte offset of its opcode.
    pub verbose: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            language: FALLBACK_LANGUAGE.to_string(),
            verbose: false,
        }
    }
}
