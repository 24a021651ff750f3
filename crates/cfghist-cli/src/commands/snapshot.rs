//! Snapshot record and delta preview commands

use cfghist_core::model::SnapshotItem;
use cfghist_engine::commands::{
    apply_engine_command, EngineCommand, EngineCommandResult, RecordOptions, SyncReport,
};
use clap::{Args, Subcommand};

use crate::commands::{DbArgs, InputArgs};

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Reconcile a snapshot with an observation
    Record(RecordArgs),
    /// Print the operations a record would apply, without applying them
    ShowDelta(ShowDeltaArgs),
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Debug, Args)]
pub struct ShowDeltaArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub db: DbArgs,
}

pub fn execute(args: SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        SnapshotCommand::Record(record_args) => execute_record(record_args),
        SnapshotCommand::ShowDelta(show_args) => execute_show_delta(show_args),
    }
}

fn run(
    input: &InputArgs,
    db: &DbArgs,
    dry_run: bool,
) -> Result<SyncReport<SnapshotItem>, Box<dyn std::error::Error>> {
    let items: Vec<SnapshotItem> = input.read_items()?;
    let mut conn = db.open()?;

    let cmd = EngineCommand::RecordSnapshot {
        date: input.date(),
        items,
        options: RecordOptions {
            dry_run,
            context: None,
        },
    };
    match apply_engine_command(cmd, &mut conn)? {
        EngineCommandResult::Snapshot(report) => Ok(report),
        EngineCommandResult::Diff(_) => Err("unexpected diff result".into()),
    }
}

fn execute_record(args: RecordArgs) -> Result<(), Box<dyn std::error::Error>> {
    let report = run(&args.input, &args.db, args.dry_run)?;

    if report.dry_run {
        println!("Dry run (no commit):");
    } else {
        println!("Snapshot recorded:");
        println!("  snapshot_id: {}", report.parent_id);
    }
    println!("  date: {}", report.date.format("%Y-%m-%d %H:%M:%S"));
    println!("  creates: {}", report.summary.creates);
    println!("  updates: {}", report.summary.updates);
    println!("  deletes: {}", report.summary.deletes);
    Ok(())
}

fn execute_show_delta(args: ShowDeltaArgs) -> Result<(), Box<dyn std::error::Error>> {
    let report = run(&args.input, &args.db, true)?;
    let ops = report.ops.unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&ops)?);
    Ok(())
}
