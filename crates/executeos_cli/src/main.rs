//! ExecuteOS command-line front end.
//!
//! Opens the local database, loads the workspace and runs one subcommand.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use eyre::{Result, WrapErr};
use executeos_core::{init_logging, open_db, CoreConfig, SqliteCollectionRepository, Workspace};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config =
        CoreConfig::load(cli.config.as_deref()).wrap_err("failed to load configuration")?;

    if let Err(err) = init_logging(&config.log_level, &config.resolved_log_dir()) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let conn = open_db(&db_path)
        .wrap_err_with(|| format!("failed to open database `{}`", db_path.display()))?;
    let workspace = Workspace::load(SqliteCollectionRepository::new(&conn))?;

    commands::run(cli.command, workspace, &config)
}
