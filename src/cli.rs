//! Command-line surface

use std::path::PathBuf;

use clap::Parser;

/// Load spreadsheet rows into a PostgreSQL table
#[derive(Parser, Debug)]
#[command(name = "xl2pg", version, about)]
pub struct Args {
    /// Spreadsheet file to upload (xlsx, xlsb, xls or ods)
    pub spreadsheet: PathBuf,

    /// Database config as a JSON file: { "dbname": "", "user": "", "password": "" }.
    /// Prompts interactively when omitted
    #[arg(short = 'd', long = "db", value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// JSON mapping from spreadsheet columns to table fields
    #[arg(short = 'm', long = "map", value_name = "FILE")]
    pub map: PathBuf,

    /// Perform DELETE FROM on the target table before loading
    #[arg(long)]
    pub clear: bool,
}
