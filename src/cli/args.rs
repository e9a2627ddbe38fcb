//! CLI argument definitions using clap
//!
//! Commands:
//! - nodedb-proxy serve [--host <host>] [--port <port>] [--log-level <level>]
//! - nodedb-proxy normalize [--update] [--no-commands]

use clap::{Parser, Subcommand};

/// HTTP proxy in front of a managed document database
#[derive(Parser, Debug)]
#[command(name = "nodedb-proxy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP proxy (configuration comes from the environment)
    Serve {
        /// Host to bind to, overrides HOST
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to, overrides PORT
        #[arg(long)]
        port: Option<u16>,

        /// Minimum log severity, overrides LOG_LEVEL
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Read one JSON filter from stdin and print its normalized form
    Normalize {
        /// Treat input as an update payload (wrap nested objects for replacement)
        #[arg(long)]
        update: bool,

        /// Only convert dates, keep `$` operators as plain fields
        #[arg(long, conflicts_with = "update")]
        no_commands: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
