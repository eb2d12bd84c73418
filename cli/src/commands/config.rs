// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use agentcore_core::domain::config::AgentCoreConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./agentcore-config.yaml)
        #[arg(short, long, default_value = "./agentcore-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = AgentCoreConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        for line in discovery_lines(config_override.as_deref(), &AgentCoreConfig::search_paths()) {
            println!("  {}", line);
        }
        println!();
    }

    if as_yaml {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Agent:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    let server = &config.spec.server;
    println!("{}", "Server:".bold());
    println!("  Host: {}", server.host.as_deref().unwrap_or("(auto)"));
    println!("  Port: {}", server.port);
    println!("  Max concurrent invocations: {}", server.max_concurrent_invocations);
    println!("  Debug actions: {}", server.debug);
    println!();

    let identity = &config.spec.identity;
    println!("{}", "Identity:".bold());
    println!("  Region: {}", identity.region);
    println!(
        "  Data plane: {}",
        identity.data_plane_endpoint.as_deref().unwrap_or("(default)")
    );
    println!(
        "  Control plane: {}",
        identity.control_plane_endpoint.as_deref().unwrap_or("(default)")
    );
    println!(
        "  Polling: every {}s, timeout {}s",
        identity.polling_interval_seconds, identity.polling_timeout_seconds
    );
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", config.spec.logging.level);

    Ok(())
}

/// One line per candidate location, in the order configuration is looked up.
/// The first existing file is the one that gets loaded.
fn discovery_lines(config_override: Option<&Path>, search_paths: &[PathBuf]) -> Vec<String> {
    let mut lines = Vec::with_capacity(search_paths.len() + 1);
    match config_override {
        Some(path) => lines.push(format!("1. --config flag: {}", path.display())),
        None => lines.push(format!("1. --config flag: {}", "(not set)".dimmed())),
    }

    let mut found = config_override.is_some();
    for (i, path) in search_paths.iter().enumerate() {
        let marker = if !found && path.exists() {
            found = true;
            " (loaded)".green().to_string()
        } else {
            String::new()
        };
        lines.push(format!("{}. {}{}", i + 2, path.display(), marker));
    }
    lines
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = AgentCoreConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
