//! # Sync Session
//!
//! Host-facing wrapper that owns the tree and makes the snapshot pair explicit.
//!
//! Each call takes `&mut self`, so passes on one session are serialized and a
//! second pass can never start while one is in progress.

use crate::builder::{FrameBuilder, NodeBuilder};
use crate::config::ReconcileConfig;
use crate::errors::ReconcileResult;
use crate::reconciler::Reconciler;
use crate::report::{ReconcileOutcome, ReconcileReport};
use annotsync_diff::{compare, DiffOptions, SnapshotDiff};
use annotsync_model::{AnnotationRecord, SnapshotMessage};
use annotsync_tree::{DocumentTree, VirtualTree};
use tracing::{info, instrument, warn};

pub struct SyncSession<T, B> {
    tree: T,
    builder: B,
    reconciler: Reconciler,
    diff_options: DiffOptions,
    passes: u64,
}

impl SyncSession<VirtualTree, FrameBuilder> {
    /// Session over an empty in-memory tree
    pub fn in_memory(config: ReconcileConfig) -> Self {
        Self::new(VirtualTree::new(), FrameBuilder::new(config.clone()), config)
    }
}

impl<T, B> SyncSession<T, B>
where
    T: DocumentTree,
    B: NodeBuilder<T>,
{
    pub fn new(tree: T, builder: B, config: ReconcileConfig) -> Self {
        Self {
            tree,
            builder,
            reconciler: Reconciler::new(config),
            diff_options: DiffOptions::default(),
            passes: 0,
        }
    }

    pub fn with_diff_options(mut self, options: DiffOptions) -> Self {
        self.diff_options = options;
        self
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn into_tree(self) -> T {
        self.tree
    }

    /// Incremental passes run so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn diff(&self, message: &SnapshotMessage) -> SnapshotDiff {
        compare(&message.old_records, &message.new_records, &self.diff_options)
    }

    /// Full re-initialization: drops every container and builds all records in order.
    /// Blocks that could not be built are listed in the returned report.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn rebuild(&mut self, records: &[AnnotationRecord]) -> ReconcileResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        self.tree.clear_records()?;
        for record in records {
            let built = self.builder.build_record(record)?;
            self.tree.append_record(&record.id, built.fragment)?;
            report.records_added.push(record.id.clone());
            report.block_failures.extend(built.failures);
        }

        info!(block_failures = report.block_failures.len(), "Tree rebuilt from snapshot");
        Ok(report)
    }

    /// Diffs the snapshot pair and applies it incrementally
    pub fn apply(&mut self, message: &SnapshotMessage) -> ReconcileResult<ReconcileOutcome> {
        let diff = self.diff(message);
        self.apply_diff(&diff)
    }

    /// Applies a diff computed elsewhere
    pub fn apply_diff(&mut self, diff: &SnapshotDiff) -> ReconcileResult<ReconcileOutcome> {
        self.passes += 1;
        self.reconciler.reconcile(&mut self.tree, &self.builder, diff)
    }

    /// Like [`apply`](Self::apply), rebuilding from the new snapshot when the
    /// pass asks for it. The returned outcome is the pass's own.
    pub fn apply_or_rebuild(&mut self, message: &SnapshotMessage) -> ReconcileResult<ReconcileOutcome> {
        let outcome = self.apply(message)?;
        if let ReconcileOutcome::NeedsFullRebuild { reason } = &outcome {
            warn!(?reason, "Falling back to full rebuild");
            self.rebuild(&message.new_records)?;
        }

        Ok(outcome)
    }
}
