//! Binary entry point for netbox-mcp.
//!
//! Runs the MCP server, refreshes the reference-data cache, or traces cables
//! from the command line.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// CLI output goes to stdout/stderr directly
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use netbox_mcp::cache::{ResourceCache, ResourceRefresher};
use netbox_mcp::config::NetboxMcpConfig;
use netbox_mcp::inventory::Inventory;
use netbox_mcp::mcp::{McpServer, ToolContext, ToolRegistry};
use netbox_mcp::{Error, Result, observability};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// netbox-mcp - NetBox DCIM/IPAM and cable tracing for AI agents.
#[derive(Parser)]
#[command(name = "netbox-mcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio.
    Serve,

    /// Rebuild the cached reference-data snapshots.
    RefreshResources {
        /// Refresh even if the snapshots are still fresh.
        #[arg(long)]
        force: bool,
    },

    /// Find the cable path between two devices.
    TracePath {
        /// Device the path starts at.
        source: String,

        /// Device the path ends at.
        target: String,

        /// Maximum expansion rounds.
        #[arg(long)]
        max_iterations: Option<i64>,
    },

    /// Show every device reachable from one interface.
    TraceInterface {
        /// Device owning the interface.
        device: String,

        /// Interface to start from.
        interface: String,

        /// Maximum tree depth.
        #[arg(long)]
        max_depth: Option<i64>,
    },

    /// Show one cable and its terminations.
    Cable {
        /// Cable ID.
        id: u64,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: NetboxMcpConfig) -> Result<ExitCode> {
    let inventory = Inventory::connect(&config.netbox);
    let cache = ResourceCache::new(config.resources.dir.clone());
    let context = ToolContext {
        inventory,
        trace: config.trace,
        cache,
    };

    match command {
        Commands::Serve => cmd_serve(context, config.resources.update_interval_hours),
        Commands::RefreshResources { force } => {
            cmd_refresh(&context, config.resources.update_interval_hours, force)
        },
        Commands::TracePath {
            source,
            target,
            max_iterations,
        } => run_tool(
            context,
            "trace_devices_connection",
            json!({
                "source_device": source,
                "target_device": target,
                "max_iterations": max_iterations,
            }),
        ),
        Commands::TraceInterface {
            device,
            interface,
            max_depth,
        } => run_tool(
            context,
            "trace_from_interface",
            json!({
                "device_name": device,
                "interface_name": interface,
                "max_depth": max_depth,
            }),
        ),
        Commands::Cable { id } => run_tool(context, "get_cable", json!({ "cable_id": id })),
    }
}

/// Loads configuration: `--config`, then `NETBOX_MCP_CONFIG_PATH`, then the
/// platform default, with environment overrides applied last.
fn load_config(path: Option<&Path>) -> Result<NetboxMcpConfig> {
    let config = if let Some(config_path) = path {
        NetboxMcpConfig::load_from_file(config_path)?
    } else if let Some(config_path) = std::env::var("NETBOX_MCP_CONFIG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
    {
        NetboxMcpConfig::load_from_file(Path::new(&config_path))?
    } else {
        NetboxMcpConfig::load_default()
    };
    Ok(config.with_env_overrides())
}

/// Serves MCP on stdio after refreshing stale snapshots.
fn cmd_serve(context: ToolContext, interval_hours: u64) -> Result<ExitCode> {
    match context.inventory.backend() {
        Ok(backend) => {
            let report = ResourceRefresher::new(context.cache.clone(), interval_hours)
                .refresh_if_needed(backend, false);
            if !report.is_success() {
                tracing::warn!(
                    failed = report.failed.len(),
                    "Resource refresh incomplete, serving existing snapshots"
                );
            }
        },
        Err(e) => tracing::warn!(error = %e, "Skipping resource refresh"),
    }

    McpServer::from_context(context).run_stdio()?;
    Ok(ExitCode::SUCCESS)
}

/// Refreshes the snapshot files and prints a per-kind report.
fn cmd_refresh(context: &ToolContext, interval_hours: u64, force: bool) -> Result<ExitCode> {
    let backend = context.inventory.backend()?;
    let report = ResourceRefresher::new(context.cache.clone(), interval_hours)
        .refresh_if_needed(backend, force);

    if report.skipped {
        println!(
            "Snapshots in {} are fresh (use --force to refresh anyway)",
            context.cache.dir().display()
        );
        return Ok(ExitCode::SUCCESS);
    }
    for (kind, count) in &report.refreshed {
        println!("  {kind}: {count} records");
    }
    for (kind, cause) in &report.failed {
        eprintln!("  {kind}: failed: {cause}");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Runs one tool and prints its JSON result.
fn run_tool(context: ToolContext, name: &str, arguments: Value) -> Result<ExitCode> {
    let arguments = strip_nulls(arguments);
    let result = ToolRegistry::new(context).execute(name, arguments)?;
    let text = result.text().ok_or_else(|| Error::OperationFailed {
        operation: name.to_string(),
        cause: "tool returned no text".to_string(),
    })?;

    println!("{text}");
    Ok(if result.is_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Drops null-valued arguments so tool defaults apply.
fn strip_nulls(arguments: Value) -> Value {
    match arguments {
        Value::Object(map) => Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => other,
    }
}
