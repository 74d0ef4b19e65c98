//! # Annotation Reconciler
//!
//! Keeps a visual document tree in step with an authoritative list of
//! annotation records by applying a structural diff as the minimal set of
//! insert / remove / replace edits.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Reconciler    safety valve + record dispatch │
//! └──────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────────────────────────────────────┐
//! │ record        add / delete / modify          │
//! └──────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────────────────────────────────────┐
//! │ field         title, content, other fields   │
//! └──────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────────────────────────────────────┐
//! │ content       block list, two cursors        │
//! └──────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────────────────────────────────────┐
//! │ normalize     raw payload → inline nodes     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use annotsync_reconciler::{ReconcileConfig, SyncSession};
//!
//! let mut session = SyncSession::in_memory(ReconcileConfig::default());
//! session.rebuild(&old_records)?;
//!
//! let outcome = session.apply(&SnapshotMessage::new(old_records, new_records))?;
//! ```

mod builder;
mod config;
mod content;
mod errors;
mod field;
mod normalize;
mod reconciler;
mod record;
mod report;
mod session;

#[cfg(test)]
mod tests_content;

#[cfg(test)]
mod tests_reconciler;

pub use builder::{BuiltRecord, FrameBuilder, NodeBuilder, PLACEHOLDER_BLOCK_TYPE};
pub use config::ReconcileConfig;
pub use errors::{BuildError, ReconcileError, ReconcileResult};
pub use normalize::{BlockDecodeError, ContentBlockNormalizer};
pub use reconciler::Reconciler;
pub use report::{
    BlockFailure, FailureStage, RebuildReason, ReconcileOutcome, ReconcileReport,
    UnimplementedField,
};
pub use session::SyncSession;
