// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Bedrock AgentCore CLI
//!
//! The `bedrock-agentcore` binary hosts agents on the AgentCore runtime
//! contract and talks to running runtimes and the Identity service.
//!
//! ## Commands
//!
//! - `bedrock-agentcore serve` - Host the built-in echo agent
//! - `bedrock-agentcore invoke|ping|debug` - Call a running runtime
//! - `bedrock-agentcore identity ...` - Workload identities, tokens and API keys
//! - `bedrock-agentcore config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use agentcore_core::domain::config::AgentCoreConfig;
use bedrock_agentcore::commands::{self, ConfigCommand, IdentityCommand, InvokeArgs, ServeArgs};

/// Bedrock AgentCore - host and call agents
#[derive(Parser)]
#[command(name = "bedrock-agentcore")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "BEDROCK_AGENTCORE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true, env = "BEDROCK_AGENTCORE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the built-in echo agent on the runtime contract
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Invoke an agent
    #[command(name = "invoke")]
    Invoke(InvokeArgs),

    /// Check the health of an agent
    #[command(name = "ping")]
    Ping {
        /// Runtime base URL
        #[arg(long, env = "BEDROCK_AGENTCORE_URL", default_value = commands::DEFAULT_URL)]
        url: String,
    },

    /// Run a debug action on an agent started in debug mode
    #[command(name = "debug")]
    Debug {
        /// ping_status, job_status, force_healthy, force_busy or clear_forced_status
        #[arg(value_name = "ACTION")]
        action: String,

        /// Runtime base URL
        #[arg(long, env = "BEDROCK_AGENTCORE_URL", default_value = commands::DEFAULT_URL)]
        url: String,
    },

    /// Workload identities and credentials
    #[command(name = "identity")]
    Identity {
        #[command(subcommand)]
        command: IdentityCommand,

        /// AWS region (overrides configuration)
        #[arg(long, global = true)]
        region: Option<String>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = match &cli.log_level {
        Some(level) => level.clone(),
        None => AgentCoreConfig::load_or_default(cli.config.clone())
            .map(|c| c.spec.logging.level)
            .unwrap_or_else(|_| "info".to_string()),
    };
    init_logging(&level)?;

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::execute(args, cli.config).await,
        Some(Commands::Invoke(args)) => commands::invoke::execute(args).await,
        Some(Commands::Ping { url }) => commands::ping::execute(&url).await,
        Some(Commands::Debug { action, url }) => commands::debug::execute(&action, &url).await,
        Some(Commands::Identity { command, region }) => {
            commands::identity::handle_command(command, cli.config, region).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
