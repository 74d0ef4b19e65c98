use serde::{Deserialize, Serialize};

/// A rich-content block inside a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,

    /// Raw payload as delivered by the host; may be absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BlockContent>,
}

impl ContentBlock {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: None,
        }
    }

    /// Block carrying a string-encoded inline payload
    pub fn encoded(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: Some(BlockContent::Encoded(content.into())),
        }
    }

    /// Block carrying an already-structured inline payload
    pub fn structured(kind: impl Into<String>, content: Vec<InlineNode>) -> Self {
        Self {
            kind: kind.into(),
            content: Some(BlockContent::Structured(content)),
        }
    }
}

/// Raw block payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockContent {
    /// JSON text of a list of inline nodes
    Encoded(String),

    Structured(Vec<InlineNode>),
}

impl BlockContent {
    /// Empty strings and empty lists count as absent
    pub fn is_empty(&self) -> bool {
        match self {
            BlockContent::Encoded(text) => text.is_empty(),
            BlockContent::Structured(nodes) => nodes.is_empty(),
        }
    }
}

/// Inline content node (e.g. `{ "type": "text", "text": "Hello" }`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineNode {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Marks, links and any other attributes, kept verbatim
    #[serde(flatten)]
    pub attrs: serde_json::Map<String, serde_json::Value>,
}

impl InlineNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            attrs: serde_json::Map::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }
}

/// Block ready for node construction. `content` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBlock {
    #[serde(rename = "type")]
    pub kind: String,

    pub content: Vec<InlineNode>,
}
