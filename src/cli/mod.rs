//! CLI module for the proxy
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP proxy
//! - normalize: One-shot filter/update normalization from stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{normalize_input, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_response};
