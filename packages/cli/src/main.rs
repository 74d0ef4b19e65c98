mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{diff, reconcile, DiffArgs, ReconcileArgs};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// annotsync - keep annotation panels in step with their records
#[derive(Parser, Debug)]
#[command(name = "annotsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to annotsync.config.json in the working directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log reconciliation steps
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the structural diff between two snapshots
    Diff(DiffArgs),

    /// Build a tree from one snapshot and reconcile it to another
    Reconcile(ReconcileArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Diff(args) => diff(args, &config),
        Command::Reconcile(args) => reconcile(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
