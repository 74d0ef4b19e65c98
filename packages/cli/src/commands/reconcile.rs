use super::read_records;
use crate::config::Config;
use anyhow::Result;
use annotsync_model::SnapshotMessage;
use annotsync_reconciler::{ReconcileOutcome, ReconcileReport, SyncSession};
use annotsync_tree::{RenderedRecord, TreePatch};
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Snapshot the tree is built from
    #[arg(long)]
    pub old: PathBuf,

    /// Snapshot to reconcile the tree to
    #[arg(long)]
    pub new: PathBuf,

    /// Align lists by longest common subsequence instead of by index
    #[arg(long)]
    pub aligned: bool,

    /// Print outcome, patches and records as JSON
    #[arg(long)]
    pub json: bool,

    /// Rebuild the tree when the pass reports an ambiguous reorder
    #[arg(long)]
    pub rebuild_on_ambiguity: bool,
}

pub fn reconcile(args: ReconcileArgs, config: &Config) -> Result<()> {
    let message = SnapshotMessage::new(read_records(&args.old)?, read_records(&args.new)?);

    let mut session = SyncSession::in_memory(config.reconcile.clone())
        .with_diff_options(config.diff_options(args.aligned));
    session.rebuild(&message.old_records)?;
    let seeded = session.tree_mut().take_patches();
    debug!(patches = seeded.len(), "Seeded tree from old snapshot");

    let outcome = if args.rebuild_on_ambiguity {
        session.apply_or_rebuild(&message)?
    } else {
        session.apply(&message)?
    };

    let patches = session.tree_mut().take_patches();
    let records = session.tree().records();

    if args.json {
        let output = json!({
            "outcome": outcome,
            "patches": patches,
            "records": records,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_outcome(&outcome);
    print_patches(&patches);
    print_records(&records);

    Ok(())
}

fn print_outcome(outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Applied(report) => {
            println!("✨ {} Diff applied incrementally", "Done".green().bold());
            print_report(report);
        }
        ReconcileOutcome::NeedsFullRebuild { reason } => {
            println!(
                "⚠️  {} Full rebuild required: {:?}",
                "Skipped".yellow().bold(),
                reason
            );
        }
    }
    println!();
}

fn print_report(report: &ReconcileReport) {
    if report.is_noop() {
        println!("   {} Tree already up to date", "✓".green());
        return;
    }

    let ids = |ids: &[String]| ids.join(", ");
    if !report.records_added.is_empty() {
        println!("   Added:    {}", ids(&report.records_added));
    }
    if !report.records_deleted.is_empty() {
        println!("   Deleted:  {}", ids(&report.records_deleted));
    }
    if !report.records_modified.is_empty() {
        println!("   Modified: {}", ids(&report.records_modified));
    }
    println!(
        "   Titles: {}  Blocks: +{} -{} ~{}",
        report.titles_updated, report.blocks_inserted, report.blocks_removed, report.blocks_replaced
    );

    for failure in &report.block_failures {
        println!(
            "   {} {} block {} ({:?}): {}",
            "✗".red(),
            failure.record_id,
            failure.diff_index,
            failure.stage,
            failure.message
        );
    }
    for field in &report.unimplemented_fields {
        println!(
            "   {} {}.{} changed to {} (not rendered)",
            "!".yellow(),
            field.record_id,
            field.field,
            field.value
        );
    }
}

fn print_patches(patches: &[TreePatch]) {
    println!("📋 {} ({})", "Patches".bold(), patches.len());
    for patch in patches {
        let line = match patch {
            TreePatch::AppendRecord { record_id, .. } => format!("append record {}", record_id),
            TreePatch::RemoveRecord { record_id, path } => {
                format!("remove record {} at {:?}", record_id, path)
            }
            TreePatch::RekeyRecord { from, to, .. } => format!("rekey {} → {}", from, to),
            TreePatch::InsertChild { path, index, node } => {
                format!("insert {} at {:?}[{}]", node.name(), path, index)
            }
            TreePatch::RemoveChild { path, index } => format!("remove {:?}[{}]", path, index),
            TreePatch::SetText {
                path, characters, ..
            } => format!("set text {:?} = {:?}", path, characters),
            TreePatch::ClearRecords => "clear records".to_string(),
        };
        println!("   {}", line);
    }
    println!();
}

fn print_records(records: &[RenderedRecord]) {
    println!("🗂  {} ({})", "Records".bold(), records.len());
    for record in records {
        let title = if record.title_opacity < 1.0 {
            record.title.dimmed()
        } else {
            record.title.normal()
        };
        println!("   {} {}", record.id.cyan(), title);
        for block in &record.blocks {
            println!("     {} {}", block.kind.dimmed(), block.texts.concat());
        }
    }
}
