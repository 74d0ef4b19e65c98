//! # Annotation Model
//!
//! Snapshot types delivered by the host: annotation records, their ordered
//! content blocks, and the inline nodes a block decodes to.
//!
//! Records are immutable snapshots. Reconciliation only ever reads them.

pub mod block;
pub mod record;

pub use block::{BlockContent, ContentBlock, InlineNode, NormalizedBlock};
pub use record::{AnnotationRecord, SnapshotMessage};
