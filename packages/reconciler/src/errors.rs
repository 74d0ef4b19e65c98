//! Error types for reconciliation

use annotsync_tree::TreeError;
use thiserror::Error;

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Fatal pass-level failures
///
/// Any of these means further positional reasoning about the tree is
/// unreliable; the pass stops and the next full snapshot has to resync.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("No container for record '{id}': tree and diff are out of sync")]
    RecordNotFound { id: String },

    #[error("Record '{record_id}' has no {node} node")]
    MissingNode {
        record_id: String,
        node: &'static str,
    },

    #[error("Modified record diff has no id field")]
    MissingIdField,

    #[error("Diff declares {declared} changes for {scope} but {processed} were found")]
    DesynchronizedDiff {
        scope: String,
        declared: usize,
        processed: usize,
    },

    #[error("Failed to build node: {0}")]
    Build(#[from] BuildError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Node construction failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Block has no type")]
    MissingBlockType,

    #[error("Record has no id")]
    MissingRecordId,

    #[error("Unsupported block type '{0}'")]
    UnsupportedBlockType(String),
}
