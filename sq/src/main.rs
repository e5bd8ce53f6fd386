//! sq CLI entry point

use std::io::{self, Write};

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use sqlhandler::cli::{Cli, Command, Format};
use sqlhandler::config::Config;
use sqlhandler::{ResultSet, Value};

fn parse_level(level: &str) -> tracing::Level {
    match level.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", level);
            tracing::Level::WARN
        }
    }
}

fn setup_logging(level: &str) -> Result<()> {
    let level = parse_level(level);

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref().unwrap_or_else(|| config.log_level())).context("Failed to setup logging")?;
    info!("sq starting");

    match cli.command {
        Command::Query {
            sql,
            params,
            database,
            format,
        } => {
            if let Some(database) = database {
                config.sql.database = database;
            }
            let mut db = config.sql.open().context("Failed to open database")?;
            let params: Vec<Value> = params.into_iter().map(Value::from).collect();

            let Some(result) = db.query(&sql, &params).context("Query failed")? else {
                println!("{} no result", "✗".yellow());
                return Ok(());
            };
            print_result(&result, format)
        }
    }
}

fn print_result(result: &ResultSet, format: Format) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, result).context("Failed to encode result")?;
            writeln!(out)?;
        }
        Format::Text if result.columns.is_empty() => {
            write!(out, "{} {} rows affected", "✓".green(), result.affected_rows)?;
            if let Some(id) = result.last_insert_id {
                write!(out, " (last insert id {})", id)?;
            }
            writeln!(out)?;
        }
        Format::Text => {
            writeln!(out, "{}", result.columns.join("\t").bold())?;
            for row in &result.rows {
                let fields: Vec<String> = row.iter().map(Value::to_string).collect();
                writeln!(out, "{}", fields.join("\t"))?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
