//! CLI argument parsing for sq

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sq")]
#[command(author, version, about = "Run prepared SQL statements against the site database", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one statement and print the result
    Query {
        /// SQL with `?` placeholders
        sql: String,

        /// Positional parameters bound to the placeholders
        params: Vec<String>,

        /// Database to use instead of the configured one
        #[arg(short, long)]
        database: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Tab-separated rows with a header line
    Text,
    /// JSON document
    Json,
}
