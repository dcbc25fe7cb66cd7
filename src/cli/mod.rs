//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to the command
//! runners in [`commands`].

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// Sitesmith - front-end asset pipeline
#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(about = "Sitesmith - build scripts, styles, SVG sprites and static assets")]
#[command(version)]
pub struct Cli {
    /// Path to sitesmith.toml (default: nearest one walking up from cwd)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and publish index.html to the project root
    Build {
        /// Production mode: transpile and minify scripts
        #[arg(long)]
        production: bool,
    },
    /// Build, serve the output directory and rebuild on changes
    Watch {
        /// Port for the dev server (default: from config, 3000)
        #[arg(long)]
        port: Option<u16>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        None => commands::run_default(cli.config.as_deref(), cli.verbose),
        Some(Commands::Build { production }) => {
            commands::run_build(cli.config.as_deref(), cli.verbose, production)
        }
        Some(Commands::Watch { port }) => {
            commands::run_watch(cli.config.as_deref(), cli.verbose, port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_bare_invocation() {
        let cli = Cli::try_parse_from(["sitesmith"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parses_build() {
        let cli = Cli::try_parse_from(["sitesmith", "build", "--production"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Build { production: true })));
    }

    #[test]
    fn test_cli_parses_watch_with_port() {
        let cli = Cli::try_parse_from(["sitesmith", "watch", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Watch { port: Some(8080) })));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sitesmith", "build", "--config", "site.toml", "-v"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("site.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["sitesmith", "deploy"]).is_err());
    }
}
