// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use chrono::DateTime;
use colored::Colorize;

use agentcore_sdk::{AgentCoreClient, PingStatus};

pub async fn execute(url: &str) -> Result<()> {
    let ping = AgentCoreClient::new(url)
        .ping()
        .await
        .context("Health check failed")?;

    let status = match ping.status {
        PingStatus::Healthy => ping.status.as_str().green(),
        PingStatus::HealthyBusy => ping.status.as_str().yellow(),
    };
    println!("Status: {}", status);
    match DateTime::from_timestamp(ping.time_of_last_update, 0) {
        Some(at) => println!("Last update: {}", at.to_rfc3339()),
        None => println!("Last update: {}", ping.time_of_last_update),
    }
    Ok(())
}
