// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Invoke a running agent
//!
//! Prints a JSON answer as-is and a streamed answer one event per line.

use anyhow::{Context, Result};
use clap::Args;
use futures::StreamExt;
use serde_json::Value;

use agentcore_sdk::AgentCoreClient;

#[derive(Args)]
pub struct InvokeArgs {
    /// JSON payload, or @file.json to read it from a file
    #[arg(value_name = "PAYLOAD")]
    pub payload: String,

    /// Runtime base URL
    #[arg(long, env = "BEDROCK_AGENTCORE_URL", default_value = super::DEFAULT_URL)]
    pub url: String,

    /// Runtime session id sent with the request
    #[arg(short, long)]
    pub session_id: Option<String>,

    /// Workload access token sent with the request
    #[arg(short, long, env = "BEDROCK_AGENTCORE_WORKLOAD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

pub async fn execute(args: InvokeArgs) -> Result<()> {
    let payload = parse_payload(&args.payload)?;

    let mut client = AgentCoreClient::new(&args.url);
    if let Some(session_id) = args.session_id {
        client = client.with_session_id(session_id);
    }
    if let Some(token) = args.token {
        client = client.with_workload_access_token(token);
    }

    let mut events = client
        .invoke_stream(&payload)
        .await
        .context("Invocation failed")?;
    while let Some(event) = events.next().await {
        println!("{}", serde_json::to_string_pretty(&event?)?);
    }
    Ok(())
}

/// Parse inline JSON or, with a leading `@`, the JSON file it names.
pub fn parse_payload(raw: &str) -> Result<Value> {
    match raw.strip_prefix('@') {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read payload file {}", path))?;
            serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path))
        }
        None => serde_json::from_str(raw).context("Payload is not valid JSON"),
    }
}
