//! # Structural Diff
//!
//! Typed recursive diff between two annotation snapshots, and the reference
//! provider that computes it.
//!
//! ## Shape
//!
//! ```text
//! SnapshotDiff = ListDiff<RecordDiff>
//!   RecordDiff = EntryDiff<AnnotationRecord, RecordFieldDiff>
//!     RecordFieldDiff::Id | Title        → ScalarDiff
//!     RecordFieldDiff::Content           → ListDiff<BlockDiff>
//!       BlockDiff = EntryDiff<ContentBlock, BlockFieldDiff>
//! ```
//!
//! ## Change Counting
//!
//! **INVARIANT: `changes` on a node equals the sum of `changes` of its children.**
//!
//! - Unchanged entries and scalars count 0
//! - Added and deleted entries count 1
//! - Modified scalars count 1
//! - Modified entries and lists carry the sum of their children
//!
//! Consumers rely on this to stop walking a list once the declared count has
//! been processed.

pub mod differ;
pub mod types;

pub use differ::{compare, DiffOptions, ListAlignment};
pub use types::{
    BlockDiff, BlockFieldDiff, Changes, DiffStatus, EntryDiff, ListDiff, RecordDiff,
    RecordFieldDiff, ScalarDiff, SnapshotDiff,
};
