//! Schema migration command

use clap::Args;

use crate::commands::DbArgs;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub db: DbArgs,
}

pub fn execute(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    args.db.open()?;
    println!("Migrations applied: {}", args.db.db.display());
    Ok(())
}
