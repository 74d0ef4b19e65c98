pub mod diff;
pub mod reconcile;

pub use diff::{diff, DiffArgs};
pub use reconcile::{reconcile, ReconcileArgs};

use anyhow::{Context, Result};
use annotsync_model::AnnotationRecord;
use std::path::Path;

/// Reads a snapshot file: a JSON array of annotation records
fn read_records(path: &Path) -> Result<Vec<AnnotationRecord>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&source)
        .with_context(|| format!("{} is not a valid annotation snapshot", path.display()))
}
