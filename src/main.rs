//! xl2pg: load spreadsheet rows into a PostgreSQL table.

mod cli;
mod config;
mod load;

use anyhow::{Context, Result};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Args::parse();

    let map_cfg = config::mapping::load(&args.map)?;
    let db_cfg = config::database::resolve(args.db.as_deref())?;

    eprintln!("Loading spreadsheet");
    let mut workbook = calamine::open_workbook_auto(&args.spreadsheet)
        .with_context(|| format!("Failed to open spreadsheet: {}", args.spreadsheet.display()))?;

    load::run(&db_cfg, &map_cfg, &mut workbook, args.clear).await
}
