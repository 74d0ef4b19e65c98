//! # Content List Reconciliation
//!
//! Applies a record's content-block diff to its body node's children.
//!
//! ## Two Cursors
//!
//! The diff enumerates old positions interleaved with new insertions, while the
//! body enumerates current tree positions. They only line up until the first
//! removal, so the walk keeps a tree cursor apart from the diff index:
//!
//! ```text
//! diff:   [UNCHANGED, DELETED, ADDED, UNCHANGED]
//! slot:       0          1       1        2
//! ```
//!
//! Every entry takes the next slot. A removal hands its slot back, because the
//! following children shifted down by one.
//!
//! ## Failed Blocks
//!
//! A block that cannot be built is reported and replaced by the builder's
//! placeholder node, so the body keeps one child per block. Only when the
//! placeholder cannot be built either does an insertion hand its slot back
//! and a replacement leave the existing node alone.
//!
//! ## Early Stop
//!
//! The walk stops as soon as the list's declared change count has been
//! applied; entries after that are never visited.

use crate::builder::NodeBuilder;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::normalize::BlockDecodeError;
use crate::reconciler::{ChangeBudget, Pass};
use crate::report::{BlockFailure, FailureStage};
use annotsync_diff::{BlockDiff, Changes, EntryDiff, ListDiff};
use annotsync_model::NormalizedBlock;
use annotsync_tree::DocumentTree;
use tracing::{debug, warn};

impl<'a, T, B> Pass<'a, T, B>
where
    T: DocumentTree,
    B: NodeBuilder<T>,
{
    pub(crate) fn reconcile_content(
        &mut self,
        record_id: &str,
        container: T::NodeId,
        diff: &ListDiff<BlockDiff>,
    ) -> ReconcileResult<()> {
        let body = self
            .tree
            .body_node(container)
            .ok_or_else(|| ReconcileError::MissingNode {
                record_id: record_id.to_string(),
                node: "body",
            })?;
        let total_blocks = diff.live_entries();

        let mut budget = ChangeBudget::new(format!("content of '{}'", record_id), diff.changes);
        let mut next_slot = 0usize;

        for (diff_index, entry) in diff.entries.iter().enumerate() {
            let slot = next_slot;
            next_slot += 1;

            let changes = entry.changes();
            if changes == 0 {
                continue;
            }
            budget.reserve(changes)?;

            match entry {
                EntryDiff::Unchanged { .. } => {}
                EntryDiff::Added { current } => {
                    let block = self.normalized_or_blank(
                        record_id,
                        diff_index,
                        &current.kind,
                        self.normalizer.normalize(current),
                    );
                    debug!(record_id, diff_index, slot, kind = %block.kind, "Inserting block");

                    match self.built_or_placeholder(record_id, diff_index, &block, total_blocks) {
                        Some(node) => {
                            self.tree.insert_child(body, slot, node)?;
                            self.report.blocks_inserted += 1;
                        }
                        None => next_slot -= 1,
                    }
                }
                EntryDiff::Deleted { .. } => {
                    debug!(record_id, diff_index, slot, "Removing block");
                    self.tree.remove_child(body, slot)?;
                    self.report.blocks_removed += 1;
                    next_slot -= 1;
                }
                EntryDiff::Modified { .. } => {
                    let kind = entry.current_kind().unwrap_or_default();
                    let block = self.normalized_or_blank(
                        record_id,
                        diff_index,
                        kind,
                        self.normalizer.normalize_modified(entry),
                    );
                    debug!(record_id, diff_index, slot, kind = %block.kind, "Replacing block");

                    if let Some(node) =
                        self.built_or_placeholder(record_id, diff_index, &block, total_blocks)
                    {
                        self.tree.remove_child(body, slot)?;
                        self.tree.insert_child(body, slot, node)?;
                        self.report.blocks_replaced += 1;
                    }
                }
            }

            if budget.exhausted() {
                debug!(record_id, diff_index, "All declared content changes applied");
                return Ok(());
            }
        }

        budget.finish()
    }

    fn normalized_or_blank(
        &mut self,
        record_id: &str,
        diff_index: usize,
        kind: &str,
        normalized: Result<NormalizedBlock, BlockDecodeError>,
    ) -> NormalizedBlock {
        normalized.unwrap_or_else(|e| {
            self.record_failure(record_id, diff_index, FailureStage::Decode, e.to_string());
            self.normalizer.blank(kind)
        })
    }

    fn built_or_placeholder(
        &mut self,
        record_id: &str,
        diff_index: usize,
        block: &NormalizedBlock,
        total_blocks: usize,
    ) -> Option<T::Fragment> {
        let error = match self.builder.build_block(block, total_blocks) {
            Ok(node) => return Some(node),
            Err(e) => e,
        };
        self.record_failure(record_id, diff_index, FailureStage::Build, error.to_string());

        match self.builder.build_placeholder(total_blocks) {
            Ok(node) => Some(node),
            Err(e) => {
                warn!(record_id, diff_index, error = %e, "Placeholder block failed, skipping slot");
                None
            }
        }
    }

    fn record_failure(
        &mut self,
        record_id: &str,
        diff_index: usize,
        stage: FailureStage,
        message: String,
    ) {
        warn!(record_id, diff_index, ?stage, error = %message, "Content block failed");
        self.report.block_failures.push(BlockFailure {
            record_id: record_id.to_string(),
            diff_index,
            stage,
            message,
        });
    }
}
