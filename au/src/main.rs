//! Aurora CLI entry point

use std::io::{self, Write};

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use aurora::cli::{Cli, Command};
use aurora::config::Config;
use aurora::{ResourceUsage, comment, verify_sidecar, write_sidecar};

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

    // stdout carries the page, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let start = ResourceUsage::now().context("Failed to sample resource usage")?;
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref().unwrap_or_else(|| config.log_level())).context("Failed to setup logging")?;
    info!("aurora starting");

    match cli.command {
        Command::Render { report, vim } => cmd_render(&config, &start, report, vim),
        Command::Hash { assets } => {
            for asset in assets {
                let digest = write_sidecar(&asset).context(format!("Failed to hash {}", asset.display()))?;
                println!("{} {} sha512-{}", "✓".green(), asset.display(), digest.dimmed());
            }
            Ok(())
        }
        Command::Verify { assets } => {
            let mut failed = 0usize;
            for asset in &assets {
                match verify_sidecar(asset) {
                    Ok(()) => println!("{} {}", "✓".green(), asset.display()),
                    Err(e) => {
                        warn!(asset = %asset.display(), error = %e, "verification failed");
                        println!("{} {}: {}", "✗".red(), asset.display(), e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                return Err(eyre::eyre!("{} of {} assets failed verification", failed, assets.len()));
            }
            Ok(())
        }
        Command::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

/// Render header, footer and closing comment for the configured page
fn cmd_render(config: &Config, start: &ResourceUsage, report: bool, vim: bool) -> Result<()> {
    let mut page = config.page.build().context("Failed to set up page")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    page.html_header(&mut out).context("Template rendering has failed")?;
    page.html_footer(&mut out).context("Failed to write page footer")?;
    if report {
        out.write_all(page.variables_report().as_bytes())?;
    }

    let project_file = config.project_file.clone().unwrap_or_else(|| page.template_path());
    let closing = comment(start, &project_file, &config.version_marker, vim)?;
    out.write_all(closing.as_bytes())?;
    out.flush()?;

    info!(replaced = page.replaced().len(), "page rendered");
    Ok(())
}
