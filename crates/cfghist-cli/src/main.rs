//! cfghist CLI
//!
//! Command-line interface for recording configuration history

use cfghist_core::logging_facility::{init, Profile};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cfghist")]
#[command(about = "cfghist - Configuration history snapshots and diffs", long_about = None)]
struct Cli {
    /// Emit JSON logs (production profile)
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply schema migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Snapshot operations
    Snapshot(commands::snapshot::SnapshotArgs),
    /// Diff operations
    Diff(commands::diff::DiffArgs),
}

fn main() {
    let cli = Cli::parse();

    init(if cli.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args),
        Commands::Snapshot(args) => commands::snapshot::execute(args),
        Commands::Diff(args) => commands::diff::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
