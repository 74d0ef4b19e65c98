//! # Record Reconciliation
//!
//! Routes one record entry to add / remove / modify handling.
//!
//! - ADDED: build a container and append it to the wrapper
//! - DELETED: detach the container found by the deleted record's id, immediately
//! - MODIFIED: find the container by the *current* id, then walk the field
//!   diffs in declared order until the record's declared change count is used up
//!
//! A modified record whose id changed is found under its original id and
//! moved to the new id in the tree's index, and renamed, before its fields
//! are applied.

use crate::builder::NodeBuilder;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::reconciler::{ChangeBudget, Pass};
use annotsync_diff::{Changes, EntryDiff, RecordDiff, RecordFieldDiff, ScalarDiff};
use annotsync_model::AnnotationRecord;
use annotsync_tree::DocumentTree;
use tracing::debug;

impl<'a, T, B> Pass<'a, T, B>
where
    T: DocumentTree,
    B: NodeBuilder<T>,
{
    pub(crate) fn reconcile_record(&mut self, entry: &RecordDiff) -> ReconcileResult<()> {
        match entry {
            EntryDiff::Unchanged { .. } => Ok(()),
            EntryDiff::Added { current } => self.add_record(current),
            EntryDiff::Deleted { original } => self.delete_record(original),
            EntryDiff::Modified { changes, fields } => self.modify_record(entry, *changes, fields),
        }
    }

    fn add_record(&mut self, record: &AnnotationRecord) -> ReconcileResult<()> {
        debug!(record_id = %record.id, blocks = record.content.len(), "Adding record");

        let built = self.builder.build_record(record)?;
        self.tree.append_record(&record.id, built.fragment)?;
        self.report.records_added.push(record.id.clone());
        self.report.block_failures.extend(built.failures);

        Ok(())
    }

    fn delete_record(&mut self, record: &AnnotationRecord) -> ReconcileResult<()> {
        debug!(record_id = %record.id, "Deleting record");

        if self.tree.record_container(&record.id).is_none() {
            return Err(ReconcileError::RecordNotFound {
                id: record.id.clone(),
            });
        }
        self.tree.remove_record(&record.id)?;
        self.report.records_deleted.push(record.id.clone());

        Ok(())
    }

    fn modify_record(
        &mut self,
        entry: &RecordDiff,
        declared: usize,
        fields: &[RecordFieldDiff],
    ) -> ReconcileResult<()> {
        let (record_id, container) = self.locate_container(entry)?;
        debug!(record_id = %record_id, changes = declared, "Modifying record");

        let mut budget = ChangeBudget::new(format!("record '{}'", record_id), declared);
        for field in fields {
            let changes = field.changes();
            if changes == 0 {
                continue;
            }

            budget.reserve(changes)?;
            self.reconcile_field(&record_id, container, field)?;

            if budget.exhausted() {
                break;
            }
        }
        budget.finish()?;

        self.report.records_modified.push(record_id);
        Ok(())
    }

    fn locate_container(&mut self, entry: &RecordDiff) -> ReconcileResult<(String, T::NodeId)> {
        let id = entry.id_diff().ok_or(ReconcileError::MissingIdField)?;
        let current = id.current();

        if let Some(container) = self.tree.record_container(current) {
            return Ok((current.clone(), container));
        }

        if let ScalarDiff::Modified { original, .. } = id {
            if self.tree.record_container(original).is_some() {
                debug!(from = %original, to = %current, "Rekeying record container");
                let name = self.builder.record_name(current);
                let container = self.tree.rekey_record(original, current, &name)?;
                return Ok((current.clone(), container));
            }
        }

        Err(ReconcileError::RecordNotFound {
            id: current.clone(),
        })
    }
}
