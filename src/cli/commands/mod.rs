//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod search;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "ticketcheck")]
#[command(about = "Ticket pickup status lookup backed by Google Sheets")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the lookup web server
    Serve {
        /// Address to bind: PORT, HOST, or HOST:PORT (defaults from settings)
        bind: Option<String>,
    },

    /// Run a single lookup and print the JSON result
    Search {
        /// Name or phone number suffix to look up
        keyword: String,
        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Verify credentials and count the rows in the configured range
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Search { keyword, pretty } => {
            search::cmd_search(&settings, &keyword, pretty).await
        }
        Commands::Check => check::cmd_check(&settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ticketcheck",
            "search",
            "Alice",
            "--pretty",
            "-v",
            "--config",
            "ticketcheck.toml",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("ticketcheck.toml")));
        match cli.command {
            Commands::Search { keyword, pretty } => {
                assert_eq!(keyword, "Alice");
                assert!(pretty);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_parse_serve_without_bind() {
        let cli = Cli::try_parse_from(["ticketcheck", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { bind: None }));
    }
}
