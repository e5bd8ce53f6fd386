//! CLI argument parsing for aurora

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "au")]
#[command(author, version, about = "HTML5 template engine with subresource integrity", long_about = None)]
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
    /// Render the configured page to stdout
    Render {
        /// Append the list of substituted variables
        #[arg(short, long)]
        report: bool,

        /// Add a vim modeline to the closing comment
        #[arg(long)]
        vim: bool,
    },

    /// Write .sha512 integrity files for assets
    Hash {
        /// Asset files to hash
        #[arg(required = true)]
        assets: Vec<PathBuf>,
    },

    /// Check assets against their .sha512 integrity files
    Verify {
        /// Asset files to check
        #[arg(required = true)]
        assets: Vec<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from(["au", "-c", "site.yml", "render", "--report"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("site.yml")));
        assert!(matches!(
            cli.command,
            Command::Render {
                report: true,
                vim: false
            }
        ));
    }

    #[test]
    fn test_hash_requires_assets() {
        assert!(Cli::try_parse_from(["au", "hash"]).is_err());
    }

    #[test]
    fn test_global_log_level_after_subcommand() {
        let cli = Cli::try_parse_from(["au", "verify", "a.css", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
