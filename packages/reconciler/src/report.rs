use serde::Serialize;

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReconcileOutcome {
    /// The diff was applied incrementally
    Applied(ReconcileReport),

    /// Nothing was applied; the caller should rebuild from the new snapshot
    NeedsFullRebuild { reason: RebuildReason },
}

impl ReconcileOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ReconcileOutcome::Applied(_))
    }

    pub fn report(&self) -> Option<&ReconcileReport> {
        match self {
            ReconcileOutcome::Applied(report) => Some(report),
            ReconcileOutcome::NeedsFullRebuild { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RebuildReason {
    /// The first changed record changed its id while other changes are in
    /// flight, which cannot be told apart from a reorder
    #[serde(rename_all = "camelCase")]
    AmbiguousReorder {
        original_id: String,
        current_id: String,
        changes: usize,
    },

    /// A record id is added while the same id is deleted, modified or still
    /// mounted, which is how an aligned diff expresses a moved record
    #[serde(rename_all = "camelCase")]
    MovedRecord { id: String },
}

/// What a pass did to the tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub records_added: Vec<String>,
    pub records_deleted: Vec<String>,
    pub records_modified: Vec<String>,
    pub titles_updated: usize,
    pub blocks_inserted: usize,
    pub blocks_removed: usize,
    pub blocks_replaced: usize,
    /// Blocks that could not be decoded or built; each is scoped to itself
    pub block_failures: Vec<BlockFailure>,
    /// Changed fields with no rendering rule; reported, not applied
    pub unimplemented_fields: Vec<UnimplementedField>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFailure {
    pub record_id: String,
    /// Position of the block's entry in the content diff, or in the record
    /// when the whole record was built
    pub diff_index: usize,
    pub stage: FailureStage,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureStage {
    /// Payload could not be decoded; a blank block was used instead
    Decode,

    /// Node construction failed; a placeholder node took its place
    Build,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnimplementedField {
    pub record_id: String,
    pub field: String,
    pub value: serde_json::Value,
}
