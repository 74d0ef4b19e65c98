//! Field-level reconciliation within one modified record

use crate::builder::NodeBuilder;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::reconciler::Pass;
use crate::report::UnimplementedField;
use annotsync_diff::{RecordFieldDiff, ScalarDiff};
use annotsync_tree::DocumentTree;
use tracing::{debug, warn};

impl<'a, T, B> Pass<'a, T, B>
where
    T: DocumentTree,
    B: NodeBuilder<T>,
{
    /// Applies one changed field to the record's container
    pub(crate) fn reconcile_field(
        &mut self,
        record_id: &str,
        container: T::NodeId,
        field: &RecordFieldDiff,
    ) -> ReconcileResult<()> {
        match field {
            // Applied while locating the container
            RecordFieldDiff::Id(_) => Ok(()),
            RecordFieldDiff::Title(diff) => self.update_title(record_id, container, diff),
            RecordFieldDiff::Content(diff) => self.reconcile_content(record_id, container, diff),
            RecordFieldDiff::Extra { name, diff } => {
                warn!(
                    record_id,
                    field = %name,
                    value = %diff.current(),
                    "No rendering rule for changed field"
                );
                self.report.unimplemented_fields.push(UnimplementedField {
                    record_id: record_id.to_string(),
                    field: name.clone(),
                    value: diff.current().clone(),
                });
                Ok(())
            }
        }
    }

    fn update_title(
        &mut self,
        record_id: &str,
        container: T::NodeId,
        diff: &ScalarDiff<String>,
    ) -> ReconcileResult<()> {
        let node = self
            .tree
            .title_node(container)
            .ok_or_else(|| ReconcileError::MissingNode {
                record_id: record_id.to_string(),
                node: "title",
            })?;

        let (characters, opacity) = self.config.title_presentation(diff.current());
        debug!(record_id, characters, opacity, "Updating title");
        self.tree.set_text(node, characters, opacity)?;
        self.report.titles_updated += 1;

        Ok(())
    }
}
