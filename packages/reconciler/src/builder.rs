//! # Node Construction
//!
//! Builders turn records and normalized blocks into detached fragments that a
//! [`DocumentTree`] inserts as a unit. Reconciliation never looks inside them.
//!
//! A block that cannot be built is replaced by a placeholder node, so a body
//! always has exactly one child per content block.

use crate::config::ReconcileConfig;
use crate::errors::BuildError;
use crate::normalize::ContentBlockNormalizer;
use crate::report::{BlockFailure, FailureStage};
use annotsync_model::{AnnotationRecord, NormalizedBlock};
use annotsync_tree::{DocumentTree, VNode, VirtualTree, BODY_NODE_NAME, TITLE_NODE_NAME};
use tracing::warn;

const REGULAR_ITEM_SPACING: f32 = 8.0;
const COMPACT_ITEM_SPACING: f32 = 4.0;

/// Type given to stand-in blocks
pub const PLACEHOLDER_BLOCK_TYPE: &str = "unsupported";

/// A record fragment and the blocks that were substituted while building it
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRecord<F> {
    pub fragment: F,
    pub failures: Vec<BlockFailure>,
}

pub trait NodeBuilder<T: DocumentTree> {
    /// Name of a record's container node
    fn record_name(&self, record_id: &str) -> String;

    /// Complete container for a record: title node plus body with every block
    fn build_record(&self, record: &AnnotationRecord) -> Result<BuiltRecord<T::Fragment>, BuildError>;

    /// Node for one block; `total_blocks` counts the record's live blocks
    fn build_block(
        &self,
        block: &NormalizedBlock,
        total_blocks: usize,
    ) -> Result<T::Fragment, BuildError>;

    /// Stand-in for a block that could not be built
    fn build_placeholder(&self, total_blocks: usize) -> Result<T::Fragment, BuildError>;
}

/// Builds [`VNode`] fragments for a [`VirtualTree`]
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    config: ReconcileConfig,
    normalizer: ContentBlockNormalizer,
}

impl FrameBuilder {
    pub fn new(config: ReconcileConfig) -> Self {
        let normalizer = ContentBlockNormalizer::new(config.default_block_text.as_str());
        Self { config, normalizer }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    fn item_spacing(&self, total_blocks: usize) -> f32 {
        if total_blocks > self.config.compact_block_threshold {
            COMPACT_ITEM_SPACING
        } else {
            REGULAR_ITEM_SPACING
        }
    }

    fn title(&self, title: &str) -> VNode {
        let (characters, opacity) = self.config.title_presentation(title);
        VNode::text(TITLE_NODE_NAME, characters).with_opacity(opacity)
    }
}

impl NodeBuilder<VirtualTree> for FrameBuilder {
    fn record_name(&self, record_id: &str) -> String {
        format!("Annot {}", record_id)
    }

    fn build_record(&self, record: &AnnotationRecord) -> Result<BuiltRecord<VNode>, BuildError> {
        if record.id.is_empty() {
            return Err(BuildError::MissingRecordId);
        }

        let total_blocks = record.content.len();
        let mut blocks = Vec::with_capacity(total_blocks);
        let mut failures = Vec::new();
        let mut fail = |index: usize, stage: FailureStage, message: String| {
            warn!(record_id = %record.id, index, ?stage, error = %message, "Substituting block");
            failures.push(BlockFailure {
                record_id: record.id.clone(),
                diff_index: index,
                stage,
                message,
            });
        };

        for (index, block) in record.content.iter().enumerate() {
            let normalized = self.normalizer.normalize(block).unwrap_or_else(|e| {
                fail(index, FailureStage::Decode, e.to_string());
                self.normalizer.blank(&block.kind)
            });

            let node = match self.build_block(&normalized, total_blocks) {
                Ok(node) => node,
                Err(e) => {
                    fail(index, FailureStage::Build, e.to_string());
                    self.build_placeholder(total_blocks)?
                }
            };
            blocks.push(node);
        }

        let fragment = VNode::frame(self.record_name(&record.id))
            .with_child(self.title(&record.title))
            .with_child(
                VNode::frame(BODY_NODE_NAME)
                    .with_item_spacing(self.item_spacing(total_blocks))
                    .with_children(blocks),
            );

        Ok(BuiltRecord { fragment, failures })
    }

    fn build_block(&self, block: &NormalizedBlock, total_blocks: usize) -> Result<VNode, BuildError> {
        if block.kind.is_empty() {
            return Err(BuildError::MissingBlockType);
        }

        let texts = block
            .content
            .iter()
            .map(|inline| VNode::text(inline.kind.as_str(), inline.text.clone().unwrap_or_default()))
            .collect();

        Ok(VNode::frame(block.kind.as_str())
            .with_item_spacing(self.item_spacing(total_blocks))
            .with_children(texts))
    }

    fn build_placeholder(&self, total_blocks: usize) -> Result<VNode, BuildError> {
        self.build_block(&self.normalizer.blank(PLACEHOLDER_BLOCK_TYPE), total_blocks)
    }
}
