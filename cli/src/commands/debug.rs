// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};

use agentcore_core::domain::invocation::DebugAction;
use agentcore_sdk::AgentCoreClient;

const ACTIONS: [DebugAction; 5] = [
    DebugAction::PingStatus,
    DebugAction::JobStatus,
    DebugAction::ForceHealthy,
    DebugAction::ForceBusy,
    DebugAction::ClearForcedStatus,
];

pub async fn execute(action: &str, url: &str) -> Result<()> {
    let Some(action) = DebugAction::parse(action) else {
        let known: Vec<&str> = ACTIONS.iter().map(|a| a.as_str()).collect();
        anyhow::bail!("Unknown debug action '{}'. Expected one of: {}", action, known.join(", "));
    };

    let response = AgentCoreClient::new(url)
        .debug_action(action.as_str())
        .await
        .with_context(|| format!("Debug action {} failed", action.as_str()))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
