use annotsync_model::{AnnotationRecord, BlockContent, ContentBlock};
use serde::{Deserialize, Serialize};

/// Status tag carried by every diff node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffStatus {
    Unchanged,
    Added,
    Deleted,
    Modified,
}

/// Common view over every diff node
pub trait Changes {
    fn status(&self) -> DiffStatus;

    /// Number of changed leaves reachable beneath this node
    fn changes(&self) -> usize;
}

/// Diff of a leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarDiff<T> {
    Unchanged { current: T },
    Modified { original: T, current: T },
}

impl<T> ScalarDiff<T> {
    pub fn unchanged(current: T) -> Self {
        ScalarDiff::Unchanged { current }
    }

    pub fn modified(original: T, current: T) -> Self {
        ScalarDiff::Modified { original, current }
    }

    /// Value in the new snapshot
    pub fn current(&self) -> &T {
        match self {
            ScalarDiff::Unchanged { current } | ScalarDiff::Modified { current, .. } => current,
        }
    }

    /// Value in the old snapshot
    pub fn original(&self) -> &T {
        match self {
            ScalarDiff::Unchanged { current } => current,
            ScalarDiff::Modified { original, .. } => original,
        }
    }

    pub fn is_modified(&self) -> bool {
        matches!(self, ScalarDiff::Modified { .. })
    }
}

impl<T: PartialEq + Clone> ScalarDiff<T> {
    pub fn between(original: &T, current: &T) -> Self {
        if original == current {
            ScalarDiff::unchanged(current.clone())
        } else {
            ScalarDiff::modified(original.clone(), current.clone())
        }
    }
}

impl<T> Changes for ScalarDiff<T> {
    fn status(&self) -> DiffStatus {
        match self {
            ScalarDiff::Unchanged { .. } => DiffStatus::Unchanged,
            ScalarDiff::Modified { .. } => DiffStatus::Modified,
        }
    }

    fn changes(&self) -> usize {
        match self {
            ScalarDiff::Unchanged { .. } => 0,
            ScalarDiff::Modified { .. } => 1,
        }
    }
}

/// Diff of one list entry whose value has named fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryDiff<T, F> {
    Unchanged { current: T },
    Added { current: T },
    /// Reported at the entry's position in the old list
    Deleted { original: T },
    /// Per-field diffs in declaration order; `changes` is the declared total
    Modified { changes: usize, fields: Vec<F> },
}

impl<T, F: Changes> EntryDiff<T, F> {
    /// Builds a modified entry, or an unchanged one when no field changed
    pub fn from_fields(current: T, fields: Vec<F>) -> Self {
        let changes: usize = fields.iter().map(Changes::changes).sum();
        if changes == 0 {
            EntryDiff::Unchanged { current }
        } else {
            EntryDiff::Modified { changes, fields }
        }
    }
}

impl<T, F> Changes for EntryDiff<T, F> {
    fn status(&self) -> DiffStatus {
        match self {
            EntryDiff::Unchanged { .. } => DiffStatus::Unchanged,
            EntryDiff::Added { .. } => DiffStatus::Added,
            EntryDiff::Deleted { .. } => DiffStatus::Deleted,
            EntryDiff::Modified { .. } => DiffStatus::Modified,
        }
    }

    fn changes(&self) -> usize {
        match self {
            EntryDiff::Unchanged { .. } => 0,
            EntryDiff::Added { .. } | EntryDiff::Deleted { .. } => 1,
            EntryDiff::Modified { changes, .. } => *changes,
        }
    }
}

/// Ordered list diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDiff<E> {
    /// Declared total of changed leaves beneath this list
    pub changes: usize,
    pub entries: Vec<E>,
}

impl<E: Changes> ListDiff<E> {
    /// Builds a list diff whose declared count is the sum of its entries
    pub fn from_entries(entries: Vec<E>) -> Self {
        let changes = entries.iter().map(Changes::changes).sum();
        Self { changes, entries }
    }

    /// Sum of the entries' own counts, for checking against `changes`
    pub fn counted_changes(&self) -> usize {
        self.entries.iter().map(Changes::changes).sum()
    }

    /// Entries that will still exist once the diff is applied
    pub fn live_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status() != DiffStatus::Deleted)
            .count()
    }

    /// First entry whose status is not UNCHANGED
    pub fn first_changed(&self) -> Option<&E> {
        self.entries
            .iter()
            .find(|entry| entry.status() != DiffStatus::Unchanged)
    }
}

impl<E> Changes for ListDiff<E> {
    fn status(&self) -> DiffStatus {
        if self.changes == 0 {
            DiffStatus::Unchanged
        } else {
            DiffStatus::Modified
        }
    }

    fn changes(&self) -> usize {
        self.changes
    }
}

/// Field-level diff of a content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "diff", rename_all = "camelCase")]
pub enum BlockFieldDiff {
    #[serde(rename = "type")]
    Kind(ScalarDiff<String>),
    Content(ScalarDiff<Option<BlockContent>>),
}

impl Changes for BlockFieldDiff {
    fn status(&self) -> DiffStatus {
        match self {
            BlockFieldDiff::Kind(diff) => diff.status(),
            BlockFieldDiff::Content(diff) => diff.status(),
        }
    }

    fn changes(&self) -> usize {
        match self {
            BlockFieldDiff::Kind(diff) => diff.changes(),
            BlockFieldDiff::Content(diff) => diff.changes(),
        }
    }
}

/// Field-level diff of an annotation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "diff", rename_all = "camelCase")]
pub enum RecordFieldDiff {
    Id(ScalarDiff<String>),
    Title(ScalarDiff<String>),
    Content(ListDiff<BlockDiff>),
    /// Host field outside the typed model
    Extra {
        name: String,
        diff: ScalarDiff<serde_json::Value>,
    },
}

impl RecordFieldDiff {
    pub fn name(&self) -> &str {
        match self {
            RecordFieldDiff::Id(_) => "id",
            RecordFieldDiff::Title(_) => "title",
            RecordFieldDiff::Content(_) => "content",
            RecordFieldDiff::Extra { name, .. } => name,
        }
    }
}

impl Changes for RecordFieldDiff {
    fn status(&self) -> DiffStatus {
        match self {
            RecordFieldDiff::Id(diff) | RecordFieldDiff::Title(diff) => diff.status(),
            RecordFieldDiff::Content(diff) => diff.status(),
            RecordFieldDiff::Extra { diff, .. } => diff.status(),
        }
    }

    fn changes(&self) -> usize {
        match self {
            RecordFieldDiff::Id(diff) | RecordFieldDiff::Title(diff) => diff.changes(),
            RecordFieldDiff::Content(diff) => diff.changes(),
            RecordFieldDiff::Extra { diff, .. } => diff.changes(),
        }
    }
}

pub type BlockDiff = EntryDiff<ContentBlock, BlockFieldDiff>;
pub type RecordDiff = EntryDiff<AnnotationRecord, RecordFieldDiff>;
pub type SnapshotDiff = ListDiff<RecordDiff>;

impl RecordDiff {
    /// The `id` field diff of a modified record
    pub fn id_diff(&self) -> Option<&ScalarDiff<String>> {
        match self {
            EntryDiff::Modified { fields, .. } => fields.iter().find_map(|field| match field {
                RecordFieldDiff::Id(diff) => Some(diff),
                _ => None,
            }),
            _ => None,
        }
    }

    /// True for a modified record whose `id` itself changed
    pub fn id_modified(&self) -> bool {
        self.id_diff().is_some_and(ScalarDiff::is_modified)
    }
}

impl BlockDiff {
    /// Current `type` of a modified block
    pub fn current_kind(&self) -> Option<&str> {
        match self {
            EntryDiff::Modified { fields, .. } => fields.iter().find_map(|field| match field {
                BlockFieldDiff::Kind(diff) => Some(diff.current().as_str()),
                _ => None,
            }),
            EntryDiff::Unchanged { current } | EntryDiff::Added { current } => {
                Some(current.kind.as_str())
            }
            EntryDiff::Deleted { .. } => None,
        }
    }

    /// Current raw payload of a modified block
    pub fn current_content(&self) -> Option<&BlockContent> {
        match self {
            EntryDiff::Modified { fields, .. } => fields.iter().find_map(|field| match field {
                BlockFieldDiff::Content(diff) => diff.current().as_ref(),
                _ => None,
            }),
            EntryDiff::Unchanged { current } | EntryDiff::Added { current } => {
                current.content.as_ref()
            }
            EntryDiff::Deleted { .. } => None,
        }
    }
}
