pub mod diff;
pub mod migrate;
pub mod snapshot;

use chrono::{DateTime, Utc};
use clap::Args;
use rusqlite::Connection;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Database location shared by every subcommand.
#[derive(Debug, Args)]
pub struct DbArgs {
    #[arg(long, default_value = ".cfghist/history.db")]
    pub db: PathBuf,
}

impl DbArgs {
    /// Open the database, creating its directory, and bring the schema up to date.
    pub fn open(&self) -> Result<Connection, Box<dyn std::error::Error>> {
        if let Some(dir) = self.db.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| cfghist_store::errors::io_error("open_db", e))?;
        }
        let mut conn = cfghist_store::db::open(&self.db)?;
        cfghist_store::migrations::apply_migrations(&mut conn)?;
        Ok(conn)
    }
}

/// Observation input shared by record commands.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// JSON array of items; `-` reads stdin
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Observation time (RFC 3339); defaults to now
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,
}

impl InputArgs {
    pub fn date(&self) -> DateTime<Utc> {
        self.date.unwrap_or_else(Utc::now)
    }

    pub fn read_items<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<Vec<T>, Box<dyn std::error::Error>> {
        let text = if self.input == "-" {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        } else {
            std::fs::read_to_string(Path::new(&self.input))?
        };
        Ok(serde_json::from_str(&text)?)
    }
}
