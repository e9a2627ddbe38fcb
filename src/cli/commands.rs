//! CLI command implementations

use serde_json::Value;

use crate::http_server::{HttpServer, ProxyConfig};
use crate::observability::{Logger, Severity};
use crate::query::{normalize, wrap_for_replacement, CommandFactory, StandardCommands};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_response};

/// Main entry point for CLI
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            host,
            port,
            log_level,
        } => serve(host, port, log_level),
        Command::Normalize {
            update,
            no_commands,
        } => {
            let input = read_request()?;
            write_response(normalize_input(&input, update, no_commands)?)
        }
    }
}

/// Start the proxy over an in-memory store
///
/// Configuration is read from the environment; flags override it.
pub fn serve(host: Option<String>, port: Option<u16>, log_level: Option<String>) -> CliResult<()> {
    let mut config = ProxyConfig::from_env()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(level) = log_level {
        config.log_level = level
            .parse::<Severity>()
            .map_err(|e| CliError::config_error(e.to_string()))?;
    }

    Logger::set_min_severity(config.log_level);

    let server = HttpServer::with_memory_store(config.server.clone(), &config.database);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Normalize one JSON document and render it in wire form
///
/// `update` applies the replacement wrapper; `no_commands` converts dates only.
pub fn normalize_input(input: &Value, update: bool, no_commands: bool) -> CliResult<Value> {
    let commands = StandardCommands;
    let factory: Option<&dyn CommandFactory> = if no_commands {
        None
    } else {
        Some(&commands)
    };

    let mut node = normalize(input, factory)?;
    if update {
        node = wrap_for_replacement(node, &commands);
    }
    Ok(serde_json::to_value(&node)?)
}
