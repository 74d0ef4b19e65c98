//! # Content Block Normalization
//!
//! Turns a raw block payload into a [`NormalizedBlock`] whose content is a
//! non-empty list of inline nodes.
//!
//! - Present, non-empty payload → decoded (string-encoded) or taken as is (structured)
//! - Absent or empty payload → one text node holding the configured blank text
//! - Payload decoding to an empty list → same blank substitution
//! - Undecodable string → [`BlockDecodeError`], scoped to that one block

use annotsync_diff::BlockDiff;
use annotsync_model::{BlockContent, ContentBlock, InlineNode, NormalizedBlock};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Block content is not valid encoded inline data: {source}")]
pub struct BlockDecodeError {
    #[from]
    source: serde_json::Error,
}

#[derive(Debug, Clone)]
pub struct ContentBlockNormalizer {
    blank_text: String,
}

impl ContentBlockNormalizer {
    pub fn new(blank_text: impl Into<String>) -> Self {
        Self {
            blank_text: blank_text.into(),
        }
    }

    /// Normalizes a whole block (added blocks, freshly built records)
    pub fn normalize(&self, block: &ContentBlock) -> Result<NormalizedBlock, BlockDecodeError> {
        self.normalize_parts(&block.kind, block.content.as_ref())
    }

    /// Normalizes the new `type`/`content` of a modified block
    pub fn normalize_modified(&self, diff: &BlockDiff) -> Result<NormalizedBlock, BlockDecodeError> {
        self.normalize_parts(diff.current_kind().unwrap_or_default(), diff.current_content())
    }

    pub fn normalize_parts(
        &self,
        kind: &str,
        content: Option<&BlockContent>,
    ) -> Result<NormalizedBlock, BlockDecodeError> {
        let inline = match content {
            None => Vec::new(),
            Some(content) if content.is_empty() => Vec::new(),
            Some(BlockContent::Encoded(text)) => serde_json::from_str::<Vec<InlineNode>>(text)?,
            Some(BlockContent::Structured(nodes)) => nodes.clone(),
        };

        if inline.is_empty() {
            return Ok(self.blank(kind));
        }

        Ok(NormalizedBlock {
            kind: kind.to_string(),
            content: inline,
        })
    }

    /// Block of the given type holding only the blank text node
    pub fn blank(&self, kind: &str) -> NormalizedBlock {
        NormalizedBlock {
            kind: kind.to_string(),
            content: vec![InlineNode::text(self.blank_text.as_str())],
        }
    }
}

impl Default for ContentBlockNormalizer {
    fn default() -> Self {
        Self::new(" ")
    }
}
