//! Error types for tree primitives

use thiserror::Error;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("No container for record '{0}'")]
    RecordNotFound(String),

    #[error("A container for record '{0}' already exists")]
    DuplicateRecord(String),

    #[error("Child index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Node is not a frame")]
    NotAFrame,

    #[error("Node is not text")]
    NotText,
}
