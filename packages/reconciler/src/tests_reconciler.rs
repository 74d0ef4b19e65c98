use crate::builder::{FrameBuilder, NodeBuilder, PLACEHOLDER_BLOCK_TYPE};
use crate::config::ReconcileConfig;
use crate::errors::ReconcileError;
use crate::reconciler::Reconciler;
use crate::report::{FailureStage, RebuildReason, ReconcileOutcome};
use annotsync_diff::{compare, DiffOptions, EntryDiff, ListDiff, RecordFieldDiff, ScalarDiff};
use annotsync_model::{AnnotationRecord, ContentBlock, InlineNode};
use annotsync_tree::{DocumentTree, VirtualTree};
use serde_json::json;

fn record(id: &str, title: &str) -> AnnotationRecord {
    AnnotationRecord::new(id)
        .with_title(title)
        .with_block(ContentBlock::structured("paragraph", vec![InlineNode::text(id)]))
}

fn tree_with(records: &[AnnotationRecord]) -> (VirtualTree, FrameBuilder) {
    let builder = FrameBuilder::default();
    let mut tree = VirtualTree::new();
    for record in records {
        tree.append_record(&record.id, builder.build_record(record).unwrap().fragment)
            .unwrap();
    }
    tree.take_patches();

    (tree, builder)
}

#[test]
fn test_identical_snapshots_touch_nothing() {
    let records = vec![record("a", "A"), record("b", "B")];
    let (mut tree, builder) = tree_with(&records);
    let diff = compare(&records, &records, &DiffOptions::default());

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    assert!(outcome.report().is_some_and(|report| report.is_noop()));
    assert_eq!(tree.mutation_count(), 0);
}

#[test]
fn test_reorder_requests_rebuild_without_mutation() {
    let old = vec![record("a", "A"), record("b", "B")];
    let new = vec![record("b", "B"), record("a", "A")];
    let (mut tree, builder) = tree_with(&old);
    let diff = compare(&old, &new, &DiffOptions::default());

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::NeedsFullRebuild {
            reason: RebuildReason::AmbiguousReorder {
                original_id: "a".to_string(),
                current_id: "b".to_string(),
                changes: diff.changes,
            },
        }
    );
    assert_eq!(tree.mutation_count(), 0);
    assert_eq!(tree.record_ids(), vec!["a", "b"]);
}

#[test]
fn test_reorder_check_skips_leading_unchanged_records() {
    let old = vec![record("x", "X"), record("a", "A"), record("b", "B")];
    let new = vec![record("x", "X"), record("b", "B"), record("a", "A")];
    let (mut tree, builder) = tree_with(&old);
    let diff = compare(&old, &new, &DiffOptions::default());

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    assert!(!outcome.is_applied());
    assert_eq!(tree.mutation_count(), 0);
}

#[test]
fn test_lone_id_change_rekeys_container() {
    let old = vec![record("a", "A")];
    let new = vec![AnnotationRecord {
        id: "a2".to_string(),
        ..old[0].clone()
    }];
    let (mut tree, builder) = tree_with(&old);
    let diff = compare(&old, &new, &DiffOptions::default());
    assert_eq!(diff.changes, 1);

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    assert!(outcome.is_applied());
    assert_eq!(tree.record_ids(), vec!["a2"]);

    let container = tree.record_container("a2").unwrap();
    let rebuilt = builder.build_record(&new[0]).unwrap().fragment;
    assert_eq!(tree.to_vnode(container), Some(rebuilt));
}

#[test]
fn test_aligned_move_to_front_requests_rebuild() {
    let old = vec![record("a", "A"), record("b", "B"), record("c", "C")];
    let new = vec![record("c", "C"), record("a", "A"), record("b", "B")];
    let (mut tree, builder) = tree_with(&old);
    let diff = compare(&old, &new, &DiffOptions::aligned());

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::NeedsFullRebuild {
            reason: RebuildReason::MovedRecord { id: "c".to_string() },
        }
    );
    assert_eq!(tree.mutation_count(), 0);
    assert_eq!(tree.record_ids(), vec!["a", "b", "c"]);
}

#[test]
fn test_adding_mounted_id_requests_rebuild() {
    let (mut tree, builder) = tree_with(&[record("a", "A")]);
    let diff = ListDiff::from_entries(vec![EntryDiff::Added {
        current: record("a", "A"),
    }]);

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::NeedsFullRebuild {
            reason: RebuildReason::MovedRecord { id: "a".to_string() },
        }
    );
    assert_eq!(tree.mutation_count(), 0);
}

#[test]
fn test_added_record_with_untyped_block_is_applied() {
    let old = vec![record("a", "A")];
    let broken = record("b", "B").with_block(ContentBlock::new(""));
    let new = vec![record("a", "A"), broken];
    let (mut tree, builder) = tree_with(&old);
    let diff = compare(&old, &new, &DiffOptions::default());

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.records_added, vec!["b".to_string()]);
    assert_eq!(report.block_failures.len(), 1);
    assert_eq!(report.block_failures[0].record_id, "b");
    assert_eq!(report.block_failures[0].diff_index, 1);
    assert_eq!(report.block_failures[0].stage, FailureStage::Build);

    let kinds: Vec<String> = tree.records()[1]
        .blocks
        .iter()
        .map(|block| block.kind.clone())
        .collect();
    assert_eq!(kinds, vec!["paragraph", PLACEHOLDER_BLOCK_TYPE]);
}

#[test]
fn test_title_presentation_follows_config() {
    let config = ReconcileConfig {
        title_placeholder: "Untitled".to_string(),
        empty_title_opacity: 0.5,
        ..ReconcileConfig::default()
    };
    let old = vec![record("a", "Foo")];
    let new = vec![record("a", "")];
    let (mut tree, builder) = tree_with(&old);
    let diff = compare(&old, &new, &DiffOptions::default());

    let outcome = Reconciler::new(config).reconcile(&mut tree, &builder, &diff).unwrap();

    let rendered = &tree.records()[0];
    assert_eq!(rendered.title, "Untitled");
    assert_eq!(rendered.title_opacity, 0.5);
    assert_eq!(outcome.report().map(|report| report.titles_updated), Some(1));
}

#[test]
fn test_unknown_field_is_reported_not_applied() {
    let old = vec![record("a", "A").with_extra("color", json!("red"))];
    let new = vec![record("a", "A").with_extra("color", json!("blue"))];
    let (mut tree, builder) = tree_with(&old);
    let diff = compare(&old, &new, &DiffOptions::default());

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.unimplemented_fields.len(), 1);
    assert_eq!(report.unimplemented_fields[0].field, "color");
    assert_eq!(report.unimplemented_fields[0].value, json!("blue"));
    assert_eq!(tree.mutation_count(), 0);
}

#[test]
fn test_deleting_unknown_record_is_fatal() {
    let (mut tree, builder) = tree_with(&[record("a", "A")]);
    let diff = ListDiff::from_entries(vec![EntryDiff::Deleted {
        original: record("ghost", "G"),
    }]);

    let result = Reconciler::default().reconcile(&mut tree, &builder, &diff);

    assert_eq!(
        result,
        Err(ReconcileError::RecordNotFound {
            id: "ghost".to_string()
        })
    );
}

#[test]
fn test_modifying_unknown_record_is_fatal() {
    let (mut tree, builder) = tree_with(&[record("a", "A")]);
    let diff = ListDiff::from_entries(vec![EntryDiff::Modified {
        changes: 1,
        fields: vec![
            RecordFieldDiff::Id(ScalarDiff::unchanged("b".to_string())),
            RecordFieldDiff::Title(ScalarDiff::modified("B".to_string(), "C".to_string())),
        ],
    }]);

    let result = Reconciler::default().reconcile(&mut tree, &builder, &diff);

    assert_eq!(
        result,
        Err(ReconcileError::RecordNotFound { id: "b".to_string() })
    );
}

#[test]
fn test_modified_record_without_id_field_is_fatal() {
    let (mut tree, builder) = tree_with(&[record("a", "A")]);
    let diff = ListDiff::from_entries(vec![EntryDiff::Modified {
        changes: 1,
        fields: vec![RecordFieldDiff::Title(ScalarDiff::modified(
            "A".to_string(),
            "B".to_string(),
        ))],
    }]);

    let result = Reconciler::default().reconcile(&mut tree, &builder, &diff);

    assert_eq!(result, Err(ReconcileError::MissingIdField));
}

#[test]
fn test_declared_count_mismatch_is_rejected_up_front() {
    let (mut tree, builder) = tree_with(&[record("a", "A")]);
    let mut diff = ListDiff::from_entries(vec![EntryDiff::Added {
        current: record("b", "B"),
    }]);
    diff.changes = 2;

    let result = Reconciler::default().reconcile(&mut tree, &builder, &diff);

    assert!(matches!(
        result,
        Err(ReconcileError::DesynchronizedDiff { declared: 2, processed: 1, .. })
    ));
    assert_eq!(tree.mutation_count(), 0);
}

#[test]
fn test_record_fields_stop_at_declared_count() {
    let (mut tree, builder) = tree_with(&[record("a", "A")]);
    let diff = ListDiff::from_entries(vec![EntryDiff::Modified {
        changes: 1,
        fields: vec![
            RecordFieldDiff::Id(ScalarDiff::unchanged("a".to_string())),
            RecordFieldDiff::Title(ScalarDiff::modified("A".to_string(), "B".to_string())),
            RecordFieldDiff::Extra {
                name: "color".to_string(),
                diff: ScalarDiff::modified(json!(null), json!("red")),
            },
        ],
    }]);

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.titles_updated, 1);
    assert!(report.unimplemented_fields.is_empty());
}

#[test]
fn test_added_records_are_appended() {
    let old = vec![record("a", "A")];
    let new = vec![record("a", "A"), record("b", "B"), record("c", "C")];
    let (mut tree, builder) = tree_with(&old);
    let diff = compare(&old, &new, &DiffOptions::default());

    let outcome = Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    assert_eq!(tree.record_ids(), vec!["a", "b", "c"]);
    assert_eq!(
        outcome.report().map(|report| report.records_added.clone()),
        Some(vec!["b".to_string(), "c".to_string()])
    );
}
