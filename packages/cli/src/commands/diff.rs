use super::read_records;
use crate::config::Config;
use anyhow::Result;
use annotsync_diff::{compare, Changes, DiffStatus, EntryDiff, RecordDiff, SnapshotDiff};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Snapshot the tree currently reflects
    #[arg(long)]
    pub old: PathBuf,

    /// Authoritative snapshot to diff against
    #[arg(long)]
    pub new: PathBuf,

    /// Align lists by longest common subsequence instead of by index
    #[arg(long)]
    pub aligned: bool,

    /// Print a per-record summary instead of the JSON diff
    #[arg(short, long)]
    pub summary: bool,
}

pub fn diff(args: DiffArgs, config: &Config) -> Result<()> {
    let old = read_records(&args.old)?;
    let new = read_records(&args.new)?;

    let diff = compare(&old, &new, &config.diff_options(args.aligned));

    if args.summary {
        print_summary(&diff);
    } else {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    }

    Ok(())
}

fn print_summary(diff: &SnapshotDiff) {
    println!("🔍 {} Snapshot diff", "Computed".green().bold());
    println!("   Records: {}", diff.entries.len());
    println!("   Changes: {}", diff.changes);
    println!();

    for (index, entry) in diff.entries.iter().enumerate() {
        let label = match entry.status() {
            DiffStatus::Unchanged => "UNCHANGED".dimmed(),
            DiffStatus::Added => "ADDED".green(),
            DiffStatus::Deleted => "DELETED".red(),
            DiffStatus::Modified => "MODIFIED".yellow(),
        };
        println!(
            "   [{}] {} {} ({} changes)",
            index,
            label,
            record_label(entry),
            entry.changes()
        );
    }
}

fn record_label(entry: &RecordDiff) -> String {
    match entry {
        EntryDiff::Unchanged { current }
        | EntryDiff::Added { current } => current.id.clone(),
        EntryDiff::Deleted { original } => original.id.clone(),
        EntryDiff::Modified { .. } => match entry.id_diff() {
            Some(id) if id.is_modified() => format!("{} → {}", id.original(), id.current()),
            Some(id) => id.current().clone(),
            None => "<no id>".to_string(),
        },
    }
}
