//! toolhost-mcp: an MCP tool server over stdio.
//!
//! Serves a small set of demonstration tools through the MCP protocol.
//! Embedders depend on the library crate and register their own tools.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use toolhost_mcp::config::{self, Config};
use toolhost_mcp::mcp::server::Server;
use toolhost_mcp::mcp::transport::StdioTransport;
use toolhost_mcp::mcp::types::CallToolResult;
use toolhost_mcp::mcp::ToolRegistry;

/// MCP tool server over stdio.
///
/// Speaks JSON-RPC 2.0 on stdin/stdout; logging goes to stderr.
#[derive(Parser, Debug)]
#[command(name = "toolhost-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr: stdout carries protocol messages only.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Input for the demonstration arithmetic tools.
#[derive(Debug, Deserialize, JsonSchema)]
struct PairInput {
    /// First operand.
    a: i64,
    /// Second operand.
    b: i64,
}

/// Output of the `multiply` tool, auto-wrapped by the registry.
#[derive(Debug, Serialize)]
struct MultiplyOutput {
    product: i64,
}

/// Registers the demonstration tools.
fn build_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register("add", "Add two integers", |input: PairInput| {
        CallToolResult::text(json!({"sum": input.a + input.b}).to_string())
    });

    registry.register_json("multiply", "Multiply two integers", |input: PairInput| {
        MultiplyOutput {
            product: input.a * input.b,
        }
    });

    registry
}

/// Loads configuration, falling back to defaults when the default path is absent.
fn resolve_config(path: Option<&std::path::Path>) -> Result<Config, ExitCode> {
    match config::load_config(path) {
        Ok(cfg) => Ok(cfg),
        Err(toolhost_mcp::error::ConfigError::NotFound { .. }) if path.is_none() => {
            Ok(Config::default())
        }
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nExpected config at: {}", default_path.display());
                }
            }
            Err(ExitCode::FAILURE)
        }
    }
}

/// Entry point for the toolhost-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let cfg = match resolve_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(code) => return code,
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        server = %cfg.server.name,
        "Starting toolhost-mcp server"
    );

    let registry = build_registry();
    info!(tools = registry.len(), "Tool registry ready");

    let mut server = Server::new(
        cfg.server.name,
        env!("CARGO_PKG_VERSION"),
        cfg.server.instruction,
        Box::new(StdioTransport::new()),
        registry,
    );

    info!("MCP server ready, waiting for client connection...");

    // Run the server
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let result = runtime.block_on(server.run());

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn demo_registry_contents() {
        let registry = build_registry();
        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["add", "multiply"]);
    }

    #[test]
    fn demo_tools_work() {
        let registry = build_registry();

        let sum = registry
            .call("add", Some(json!({"a": 2, "b": 3})))
            .unwrap();
        assert_eq!(sum.is_error, Some(false));

        let product = registry
            .call("multiply", Some(json!({"a": 6, "b": 7})))
            .unwrap();
        let toolhost_mcp::mcp::Content::Text { text } = &product.content[0] else {
            panic!("expected text content");
        };
        assert!(text.contains("42"));
    }

    #[test]
    fn log_level_resolution() {
        assert_eq!(get_log_level(0, true, "debug"), Level::ERROR);
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "bogus"), Level::WARN);
        assert_eq!(get_log_level(1, false, "warn"), Level::INFO);
        assert_eq!(get_log_level(3, false, "warn"), Level::TRACE);
    }
}
