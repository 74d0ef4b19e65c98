use crate::block::ContentBlock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One annotation record as owned by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Stable identity (changes only when the record's position truly changed)
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Ordered content blocks, 1:1 with the body node's children
    #[serde(default)]
    pub content: Vec<ContentBlock>,

    /// Any further host fields, kept so their changes can be reported
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AnnotationRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            content: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.content.push(block);
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<ContentBlock>) -> Self {
        self.content.extend(blocks);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Snapshot pair delivered once per reconciliation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMessage {
    #[serde(alias = "oldAnnots")]
    pub old_records: Vec<AnnotationRecord>,

    #[serde(alias = "newAnnots")]
    pub new_records: Vec<AnnotationRecord>,
}

impl SnapshotMessage {
    pub fn new(old_records: Vec<AnnotationRecord>, new_records: Vec<AnnotationRecord>) -> Self {
        Self {
            old_records,
            new_records,
        }
    }
}
