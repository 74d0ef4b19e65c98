//! Reference diff provider
//!
//! Pure and deterministic: the same snapshot pair always yields the same diff,
//! and neither input is touched.

use crate::types::{
    BlockDiff, BlockFieldDiff, Changes, EntryDiff, ListDiff, RecordDiff, RecordFieldDiff,
    ScalarDiff, SnapshotDiff,
};
use annotsync_model::{AnnotationRecord, ContentBlock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// How list entries are paired between the old and new snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListAlignment {
    /// Index-by-index: trailing surplus is added or deleted
    #[default]
    Positional,

    /// Longest-common-subsequence alignment. Removed entries stay at their
    /// original position, interleaved with insertions; a removal directly
    /// facing an insertion is reported as a modification.
    Aligned,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffOptions {
    #[serde(default)]
    pub list_alignment: ListAlignment,
}

impl DiffOptions {
    pub fn aligned() -> Self {
        Self {
            list_alignment: ListAlignment::Aligned,
        }
    }
}

/// Diff two snapshots
#[instrument(skip(old, new), fields(old = old.len(), new = new.len()))]
pub fn compare(
    old: &[AnnotationRecord],
    new: &[AnnotationRecord],
    options: &DiffOptions,
) -> SnapshotDiff {
    let diff = diff_list(old, new, options.list_alignment, |a, b| {
        compare_record(a, b, options)
    });

    debug!(
        entries = diff.entries.len(),
        changes = diff.changes,
        "Snapshot diff computed"
    );

    diff
}

fn compare_record(
    old: &AnnotationRecord,
    new: &AnnotationRecord,
    options: &DiffOptions,
) -> RecordDiff {
    let mut fields = vec![
        RecordFieldDiff::Id(ScalarDiff::between(&old.id, &new.id)),
        RecordFieldDiff::Title(ScalarDiff::between(&old.title, &new.title)),
        RecordFieldDiff::Content(diff_list(
            &old.content,
            &new.content,
            options.list_alignment,
            compare_block,
        )),
    ];

    // Old keys first, then keys that only exist in the new record
    let mut seen = BTreeSet::new();
    let keys = old
        .extra
        .keys()
        .chain(new.extra.keys())
        .filter(|key| seen.insert(key.as_str()));

    for key in keys {
        let original = old.extra.get(key).cloned().unwrap_or_default();
        let current = new.extra.get(key).cloned().unwrap_or_default();
        fields.push(RecordFieldDiff::Extra {
            name: key.clone(),
            diff: ScalarDiff::between(&original, &current),
        });
    }

    EntryDiff::from_fields(new.clone(), fields)
}

fn compare_block(old: &ContentBlock, new: &ContentBlock) -> BlockDiff {
    EntryDiff::from_fields(
        new.clone(),
        vec![
            BlockFieldDiff::Kind(ScalarDiff::between(&old.kind, &new.kind)),
            BlockFieldDiff::Content(ScalarDiff::between(&old.content, &new.content)),
        ],
    )
}

fn diff_list<T, F, C>(
    old: &[T],
    new: &[T],
    alignment: ListAlignment,
    compare_entry: C,
) -> ListDiff<EntryDiff<T, F>>
where
    T: Clone + PartialEq,
    F: Changes,
    C: Fn(&T, &T) -> EntryDiff<T, F>,
{
    let entries = match alignment {
        ListAlignment::Positional => positional_entries(old, new, &compare_entry),
        ListAlignment::Aligned => aligned_entries(old, new, &compare_entry),
    };

    ListDiff::from_entries(entries)
}

fn positional_entries<T, F, C>(old: &[T], new: &[T], compare_entry: &C) -> Vec<EntryDiff<T, F>>
where
    T: Clone,
    C: Fn(&T, &T) -> EntryDiff<T, F>,
{
    let max_len = old.len().max(new.len());
    let mut entries = Vec::with_capacity(max_len);

    for i in 0..max_len {
        match (old.get(i), new.get(i)) {
            (Some(a), Some(b)) => entries.push(compare_entry(a, b)),
            (Some(a), None) => entries.push(EntryDiff::Deleted { original: a.clone() }),
            (None, Some(b)) => entries.push(EntryDiff::Added { current: b.clone() }),
            (None, None) => {}
        }
    }

    entries
}

fn aligned_entries<T, F, C>(old: &[T], new: &[T], compare_entry: &C) -> Vec<EntryDiff<T, F>>
where
    T: Clone + PartialEq,
    C: Fn(&T, &T) -> EntryDiff<T, F>,
{
    let (n, m) = (old.len(), new.len());

    // lcs[i][j] = length of the common subsequence of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut entries = Vec::with_capacity(n.max(m));
    let mut removed: Vec<&T> = Vec::new();
    let mut inserted: Vec<&T> = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < n || j < m {
        if i < n && j < m && old[i] == new[j] {
            flush_gap(&mut entries, &mut removed, &mut inserted, compare_entry);
            entries.push(EntryDiff::Unchanged {
                current: new[j].clone(),
            });
            i += 1;
            j += 1;
        } else if j >= m || (i < n && lcs[i + 1][j] >= lcs[i][j + 1]) {
            removed.push(&old[i]);
            i += 1;
        } else {
            inserted.push(&new[j]);
            j += 1;
        }
    }
    flush_gap(&mut entries, &mut removed, &mut inserted, compare_entry);

    entries
}

/// Emits one gap between matched entries: paired modifications, then the
/// surplus removals, then the surplus insertions.
fn flush_gap<T, F, C>(
    entries: &mut Vec<EntryDiff<T, F>>,
    removed: &mut Vec<&T>,
    inserted: &mut Vec<&T>,
    compare_entry: &C,
) where
    T: Clone,
    C: Fn(&T, &T) -> EntryDiff<T, F>,
{
    let paired = removed.len().min(inserted.len());

    for k in 0..paired {
        entries.push(compare_entry(removed[k], inserted[k]));
    }
    for original in &removed[paired..] {
        entries.push(EntryDiff::Deleted {
            original: (*original).clone(),
        });
    }
    for current in &inserted[paired..] {
        entries.push(EntryDiff::Added {
            current: (*current).clone(),
        });
    }

    removed.clear();
    inserted.clear();
}
