//! Diff record command

use cfghist_core::model::DiffItem;
use cfghist_engine::commands::{
    apply_engine_command, EngineCommand, EngineCommandResult, RecordOptions,
};
use clap::{Args, Subcommand};

use crate::commands::{DbArgs, InputArgs};

#[derive(Debug, Args)]
pub struct DiffArgs {
    #[command(subcommand)]
    pub command: DiffCommand,
}

#[derive(Debug, Subcommand)]
pub enum DiffCommand {
    /// Reconcile a diff under a snapshot with observed changes
    Record(RecordArgs),
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Id of the snapshot the diff belongs to
    #[arg(long)]
    pub snapshot_id: i64,

    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        DiffCommand::Record(record_args) => execute_record(record_args),
    }
}

fn execute_record(args: RecordArgs) -> Result<(), Box<dyn std::error::Error>> {
    let items: Vec<DiffItem> = args.input.read_items()?;
    let mut conn = args.db.open()?;

    let cmd = EngineCommand::RecordDiff {
        snapshot_id: args.snapshot_id,
        date: args.input.date(),
        items,
        options: RecordOptions {
            dry_run: args.dry_run,
            context: None,
        },
    };
    let report = match apply_engine_command(cmd, &mut conn)? {
        EngineCommandResult::Diff(report) => report,
        EngineCommandResult::Snapshot(_) => return Err("unexpected snapshot result".into()),
    };

    if report.dry_run {
        println!("Dry run (no commit):");
    } else {
        println!("Diff recorded:");
        println!("  diff_id: {}", report.parent_id);
    }
    println!("  snapshot_id: {}", args.snapshot_id);
    println!("  date: {}", report.date.format("%Y-%m-%d %H:%M:%S"));
    println!("  creates: {}", report.summary.creates);
    println!("  updates: {}", report.summary.updates);
    println!("  deletes: {}", report.summary.deletes);
    Ok(())
}
