//! # Top-Level Reconciliation
//!
//! Entry point of a pass. Decides whether an incremental update is safe, then
//! walks the record list diff in order and dispatches each changed entry.
//!
//! ## Safety Valve
//!
//! When the snapshot diff carries more than one change and the first changed
//! record is MODIFIED with its `id` MODIFIED, the change cannot be told apart
//! from a reorder of the list. The pass then returns
//! [`ReconcileOutcome::NeedsFullRebuild`] **before touching the tree**.
//!
//! The same happens when an added record's id is also deleted or modified in
//! the diff, or already has a container. Aligned diffs express a moved record
//! that way, and applying it in order would mount the id twice.
//!
//! ## Pass Contract
//!
//! - Single-threaded, run to completion, no suspension points
//! - Diff entries are consumed once, top to bottom, left to right
//! - A fatal error stops the pass; edits already applied stay applied

use crate::builder::NodeBuilder;
use crate::config::ReconcileConfig;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::normalize::ContentBlockNormalizer;
use crate::report::{RebuildReason, ReconcileOutcome, ReconcileReport};
use annotsync_diff::{Changes, DiffStatus, EntryDiff, SnapshotDiff};
use annotsync_tree::DocumentTree;
use std::collections::HashSet;
use tracing::{info, instrument};

/// Applies snapshot diffs to a [`DocumentTree`]
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
    normalizer: ContentBlockNormalizer,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        let normalizer = ContentBlockNormalizer::new(config.default_block_text.as_str());
        Self { config, normalizer }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Runs one reconciliation pass
    #[instrument(skip_all, fields(entries = diff.entries.len(), changes = diff.changes))]
    pub fn reconcile<T, B>(
        &self,
        tree: &mut T,
        builder: &B,
        diff: &SnapshotDiff,
    ) -> ReconcileResult<ReconcileOutcome>
    where
        T: DocumentTree,
        B: NodeBuilder<T>,
    {
        if let Some(reason) = detect_ambiguous_reorder(diff) {
            info!(?reason, "Ambiguous record reorder - full rebuild required");
            return Ok(ReconcileOutcome::NeedsFullRebuild { reason });
        }

        if let Some(reason) = detect_moved_record(&*tree, diff) {
            info!(?reason, "Moved record - full rebuild required");
            return Ok(ReconcileOutcome::NeedsFullRebuild { reason });
        }

        let counted = diff.counted_changes();
        if counted != diff.changes {
            return Err(ReconcileError::DesynchronizedDiff {
                scope: "record list".to_string(),
                declared: diff.changes,
                processed: counted,
            });
        }

        let mut pass = Pass {
            tree,
            builder,
            config: &self.config,
            normalizer: &self.normalizer,
            report: ReconcileReport::default(),
        };

        for entry in &diff.entries {
            pass.reconcile_record(entry)?;
        }

        let report = pass.report;
        info!(
            added = report.records_added.len(),
            deleted = report.records_deleted.len(),
            modified = report.records_modified.len(),
            block_failures = report.block_failures.len(),
            "Reconciliation pass complete"
        );

        Ok(ReconcileOutcome::Applied(report))
    }
}

/// Reorder check: only the first changed entry is inspected
fn detect_ambiguous_reorder(diff: &SnapshotDiff) -> Option<RebuildReason> {
    if diff.changes <= 1 {
        return None;
    }

    let first = diff.first_changed()?;
    if first.status() != DiffStatus::Modified || !first.id_modified() {
        return None;
    }

    let id = first.id_diff()?;
    Some(RebuildReason::AmbiguousReorder {
        original_id: id.original().clone(),
        current_id: id.current().clone(),
        changes: diff.changes,
    })
}

/// An added id that another entry still holds, or that is already mounted
fn detect_moved_record<T: DocumentTree>(tree: &T, diff: &SnapshotDiff) -> Option<RebuildReason> {
    let mut held: HashSet<&str> = HashSet::new();
    for entry in &diff.entries {
        match entry {
            EntryDiff::Deleted { original } => {
                held.insert(original.id.as_str());
            }
            EntryDiff::Modified { .. } => {
                if let Some(id) = entry.id_diff() {
                    held.insert(id.original().as_str());
                    held.insert(id.current().as_str());
                }
            }
            EntryDiff::Unchanged { .. } | EntryDiff::Added { .. } => {}
        }
    }

    diff.entries.iter().find_map(|entry| match entry {
        EntryDiff::Added { current }
            if held.contains(current.id.as_str()) || tree.record_container(&current.id).is_some() =>
        {
            Some(RebuildReason::MovedRecord {
                id: current.id.clone(),
            })
        }
        _ => None,
    })
}

/// State of one pass; the per-level steps live in `record`, `field` and `content`
pub(crate) struct Pass<'a, T: DocumentTree, B> {
    pub(crate) tree: &'a mut T,
    pub(crate) builder: &'a B,
    pub(crate) config: &'a ReconcileConfig,
    pub(crate) normalizer: &'a ContentBlockNormalizer,
    pub(crate) report: ReconcileReport,
}

/// Counts declared changes against processed ones for one early-stopping walk
#[derive(Debug)]
pub(crate) struct ChangeBudget {
    scope: String,
    declared: usize,
    processed: usize,
}

impl ChangeBudget {
    pub(crate) fn new(scope: impl Into<String>, declared: usize) -> Self {
        Self {
            scope: scope.into(),
            declared,
            processed: 0,
        }
    }

    /// Reserves `changes` before they are applied; fails if that would
    /// overshoot the declared bound
    pub(crate) fn reserve(&mut self, changes: usize) -> ReconcileResult<()> {
        let processed = self.processed + changes;
        if processed > self.declared {
            return Err(self.desynchronized(processed));
        }
        self.processed = processed;
        Ok(())
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.processed == self.declared
    }

    /// Called once the walk ran out of entries
    pub(crate) fn finish(&self) -> ReconcileResult<()> {
        if self.exhausted() {
            Ok(())
        } else {
            Err(self.desynchronized(self.processed))
        }
    }

    fn desynchronized(&self, processed: usize) -> ReconcileError {
        ReconcileError::DesynchronizedDiff {
            scope: self.scope.clone(),
            declared: self.declared,
            processed,
        }
    }
}
