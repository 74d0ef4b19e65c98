use crate::builder::{BuiltRecord, FrameBuilder, NodeBuilder, PLACEHOLDER_BLOCK_TYPE};
use crate::errors::{BuildError, ReconcileError};
use crate::reconciler::Reconciler;
use crate::report::{FailureStage, ReconcileOutcome, ReconcileReport};
use annotsync_diff::{
    BlockDiff, BlockFieldDiff, EntryDiff, ListDiff, RecordFieldDiff, ScalarDiff, SnapshotDiff,
};
use annotsync_model::{AnnotationRecord, BlockContent, ContentBlock, InlineNode, NormalizedBlock};
use annotsync_tree::{DocumentTree, VNode, VirtualTree};

fn paragraph(text: &str) -> ContentBlock {
    ContentBlock::structured("paragraph", vec![InlineNode::text(text)])
}

fn seeded(texts: &[&str]) -> (VirtualTree, FrameBuilder) {
    let builder = FrameBuilder::default();
    let record = AnnotationRecord::new("a")
        .with_title("Note")
        .with_blocks(texts.iter().map(|text| paragraph(text)).collect());

    let mut tree = VirtualTree::new();
    tree.append_record("a", builder.build_record(&record).unwrap().fragment)
        .unwrap();
    tree.take_patches();

    (tree, builder)
}

/// Snapshot diff with one modified record whose only change is its content
fn content_diff(content: ListDiff<BlockDiff>) -> SnapshotDiff {
    let record = EntryDiff::Modified {
        changes: content.changes,
        fields: vec![
            RecordFieldDiff::Id(ScalarDiff::unchanged("a".to_string())),
            RecordFieldDiff::Title(ScalarDiff::unchanged("Note".to_string())),
            RecordFieldDiff::Content(content),
        ],
    };
    ListDiff::from_entries(vec![record])
}

fn unchanged(text: &str) -> BlockDiff {
    EntryDiff::Unchanged {
        current: paragraph(text),
    }
}

fn added(block: ContentBlock) -> BlockDiff {
    EntryDiff::Added { current: block }
}

fn deleted(text: &str) -> BlockDiff {
    EntryDiff::Deleted {
        original: paragraph(text),
    }
}

fn retyped(from: &str, to: &str, text: &str) -> BlockDiff {
    EntryDiff::Modified {
        changes: 1,
        fields: vec![
            BlockFieldDiff::Kind(ScalarDiff::modified(from.to_string(), to.to_string())),
            BlockFieldDiff::Content(ScalarDiff::unchanged(Some(BlockContent::Structured(vec![
                InlineNode::text(text),
            ])))),
        ],
    }
}

/// Frame builder that has no placeholder to offer
struct NoPlaceholder(FrameBuilder);

impl NodeBuilder<VirtualTree> for NoPlaceholder {
    fn record_name(&self, record_id: &str) -> String {
        self.0.record_name(record_id)
    }

    fn build_record(&self, record: &AnnotationRecord) -> Result<BuiltRecord<VNode>, BuildError> {
        self.0.build_record(record)
    }

    fn build_block(&self, block: &NormalizedBlock, total_blocks: usize) -> Result<VNode, BuildError> {
        self.0.build_block(block, total_blocks)
    }

    fn build_placeholder(&self, _total_blocks: usize) -> Result<VNode, BuildError> {
        Err(BuildError::UnsupportedBlockType(PLACEHOLDER_BLOCK_TYPE.to_string()))
    }
}

fn block_kinds(tree: &VirtualTree) -> Vec<String> {
    tree.records()[0]
        .blocks
        .iter()
        .map(|block| block.kind.clone())
        .collect()
}

fn block_texts(tree: &VirtualTree) -> Vec<String> {
    tree.records()[0]
        .blocks
        .iter()
        .map(|block| block.texts.concat())
        .collect()
}

fn applied(outcome: ReconcileOutcome) -> ReconcileReport {
    match outcome {
        ReconcileOutcome::Applied(report) => report,
        other => panic!("Expected applied pass, got {:?}", other),
    }
}

#[test]
fn test_removal_shifts_tree_cursor() {
    let (mut tree, builder) = seeded(&["c0", "c1", "c2", "c3"]);
    let diff = content_diff(ListDiff::from_entries(vec![
        unchanged("c0"),
        deleted("c1"),
        added(paragraph("New")),
        unchanged("c3"),
    ]));

    let report = applied(Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap());

    assert_eq!(block_texts(&tree), vec!["c0", "New", "c2", "c3"]);
    assert_eq!(report.blocks_removed, 1);
    assert_eq!(report.blocks_inserted, 1);
    assert_eq!(report.records_modified, vec!["a".to_string()]);
}

#[test]
fn test_consecutive_removals_reuse_slot() {
    let (mut tree, builder) = seeded(&["c0", "c1", "c2", "c3"]);
    let diff = content_diff(ListDiff::from_entries(vec![
        deleted("c0"),
        deleted("c1"),
        unchanged("c2"),
        retyped("paragraph", "heading", "c3"),
    ]));

    Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    let blocks = &tree.records()[0].blocks;
    assert_eq!(block_texts(&tree), vec!["c2", "c3"]);
    assert_eq!(blocks[1].kind, "heading");
}

#[test]
fn test_walk_stops_once_declared_changes_are_applied() {
    let (mut tree, builder) = seeded(&["c0", "c1"]);
    let mut content = ListDiff::from_entries(vec![
        deleted("c0"),
        added(paragraph("late")),
        // Would be out of bounds if visited
        deleted("gone"),
        deleted("gone"),
    ]);
    content.changes = 1;

    Reconciler::default()
        .reconcile(&mut tree, &builder, &content_diff(content))
        .unwrap();

    assert_eq!(block_texts(&tree), vec!["c1"]);
    assert_eq!(tree.mutation_count(), 1);
}

#[test]
fn test_undecodable_block_is_inserted_blank() {
    let (mut tree, builder) = seeded(&["c0"]);
    let diff = content_diff(ListDiff::from_entries(vec![
        unchanged("c0"),
        added(ContentBlock::encoded("quote", "{oops")),
    ]));

    let report = applied(Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap());

    let blocks = &tree.records()[0].blocks;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].kind, "quote");
    assert_eq!(blocks[1].texts, vec![" ".to_string()]);

    assert_eq!(report.block_failures.len(), 1);
    assert_eq!(report.block_failures[0].diff_index, 1);
    assert_eq!(report.block_failures[0].stage, FailureStage::Decode);
    assert_eq!(report.blocks_inserted, 1);
}

#[test]
fn test_failed_insert_takes_placeholder() {
    let (mut tree, builder) = seeded(&["c0", "c1"]);
    let diff = content_diff(ListDiff::from_entries(vec![
        added(ContentBlock::new("")),
        deleted("c0"),
        unchanged("c1"),
    ]));

    let report = applied(Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap());

    assert_eq!(block_kinds(&tree), vec![PLACEHOLDER_BLOCK_TYPE, "paragraph"]);
    assert_eq!(block_texts(&tree), vec![" ", "c1"]);
    assert_eq!(report.block_failures[0].stage, FailureStage::Build);
    assert_eq!(report.block_failures[0].diff_index, 0);
    assert_eq!(report.blocks_inserted, 1);
    assert_eq!(report.blocks_removed, 1);
}

#[test]
fn test_failed_replacement_takes_placeholder() {
    let (mut tree, builder) = seeded(&["c0", "c1"]);
    let diff = content_diff(ListDiff::from_entries(vec![
        retyped("paragraph", "", "c0"),
        deleted("c1"),
    ]));

    let report = applied(Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap());

    assert_eq!(block_kinds(&tree), vec![PLACEHOLDER_BLOCK_TYPE]);
    assert_eq!(report.blocks_replaced, 1);
    assert_eq!(report.blocks_removed, 1);
    assert_eq!(report.block_failures.len(), 1);
}

#[test]
fn test_failed_insert_without_placeholder_hands_slot_back() {
    let (mut tree, _) = seeded(&["c0", "c1"]);
    let builder = NoPlaceholder(FrameBuilder::default());
    let diff = content_diff(ListDiff::from_entries(vec![
        added(ContentBlock::new("")),
        deleted("c0"),
        unchanged("c1"),
    ]));

    let report = applied(Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap());

    assert_eq!(block_texts(&tree), vec!["c1"]);
    assert_eq!(report.block_failures[0].stage, FailureStage::Build);
    assert_eq!(report.blocks_inserted, 0);
    assert_eq!(report.blocks_removed, 1);
}

#[test]
fn test_failed_replacement_without_placeholder_keeps_existing_node() {
    let (mut tree, _) = seeded(&["c0", "c1"]);
    let builder = NoPlaceholder(FrameBuilder::default());
    let diff = content_diff(ListDiff::from_entries(vec![
        retyped("paragraph", "", "c0"),
        deleted("c1"),
    ]));

    let report = applied(Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap());

    assert_eq!(block_texts(&tree), vec!["c0"]);
    assert_eq!(block_kinds(&tree), vec!["paragraph"]);
    assert_eq!(report.blocks_replaced, 0);
    assert_eq!(report.block_failures.len(), 1);
}

#[test]
fn test_entry_overshooting_declared_count_is_desync() {
    let (mut tree, builder) = seeded(&["c0"]);
    let mut content = ListDiff::from_entries(vec![EntryDiff::Modified {
        changes: 2,
        fields: vec![
            BlockFieldDiff::Kind(ScalarDiff::modified(
                "paragraph".to_string(),
                "heading".to_string(),
            )),
            BlockFieldDiff::Content(ScalarDiff::modified(None, None)),
        ],
    }]);
    content.changes = 1;

    let result = Reconciler::default().reconcile(&mut tree, &builder, &content_diff(content));

    assert_eq!(
        result,
        Err(ReconcileError::DesynchronizedDiff {
            scope: "content of 'a'".to_string(),
            declared: 1,
            processed: 2,
        })
    );
    assert_eq!(tree.mutation_count(), 0);
}

#[test]
fn test_shortfall_is_desync_after_applied_edits() {
    let (mut tree, builder) = seeded(&["c0", "c1"]);
    let mut content = ListDiff::from_entries(vec![deleted("c0"), unchanged("c1")]);
    content.changes = 3;

    let result = Reconciler::default().reconcile(&mut tree, &builder, &content_diff(content));

    assert!(matches!(
        result,
        Err(ReconcileError::DesynchronizedDiff { declared: 3, processed: 1, .. })
    ));
    // Edits made before the error stay in place
    assert_eq!(block_texts(&tree), vec!["c1"]);
}

#[test]
fn test_removing_past_the_end_is_tree_error() {
    let (mut tree, builder) = seeded(&["c0"]);
    let diff = content_diff(ListDiff::from_entries(vec![
        unchanged("c0"),
        deleted("c1"),
    ]));

    let result = Reconciler::default().reconcile(&mut tree, &builder, &diff);

    assert!(matches!(result, Err(ReconcileError::Tree(_))));
}

#[test]
fn test_missing_body_node_is_fatal() {
    let builder = FrameBuilder::default();
    let mut tree = VirtualTree::new();
    tree.append_record("a", annotsync_tree::VNode::frame("Annot a"))
        .unwrap();

    let diff = content_diff(ListDiff::from_entries(vec![added(paragraph("x"))]));
    let result = Reconciler::default().reconcile(&mut tree, &builder, &diff);

    assert_eq!(
        result,
        Err(ReconcileError::MissingNode {
            record_id: "a".to_string(),
            node: "body",
        })
    );
}

#[test]
fn test_inserted_blocks_use_live_block_count_for_spacing() {
    let (mut tree, _) = seeded(&["c0", "c1"]);
    let builder = FrameBuilder::new(crate::config::ReconcileConfig {
        compact_block_threshold: 2,
        ..Default::default()
    });
    let diff = content_diff(ListDiff::from_entries(vec![
        deleted("c0"),
        unchanged("c1"),
        added(paragraph("c2")),
    ]));

    Reconciler::default().reconcile(&mut tree, &builder, &diff).unwrap();

    let container = tree.record_container("a").unwrap();
    let body = tree.body_node(container).unwrap();
    let inserted = tree.children(body).unwrap()[1];
    // Two live blocks is not above the threshold
    assert_eq!(tree.item_spacing(inserted), Some(8.0));
}
