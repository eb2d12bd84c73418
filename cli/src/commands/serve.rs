// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Serve the built-in echo agent
//!
//! Useful for smoke-testing container images, networking and clients against
//! the runtime contract without writing an agent first.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use futures::stream;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

use agentcore_core::domain::config::AgentCoreConfig;
use agentcore_core::presentation::resolve_host;
use agentcore_core::{AgentCoreApp, HandlerError, Invocation};

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (default: 0.0.0.0 in containers, 127.0.0.1 elsewhere)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (default: from configuration, 8080)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable debug actions
    #[arg(long)]
    pub debug: bool,

    /// Maximum concurrent invocations before answering 503
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,
}

pub async fn execute(args: ServeArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = AgentCoreConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let server = &config.spec.server;
    let port = args.port.unwrap_or(server.port);
    let host = args.host.or_else(|| server.host.clone());
    let debug = args.debug || server.debug;
    let max_concurrent = args
        .max_concurrent
        .unwrap_or(server.max_concurrent_invocations);

    println!(
        "{}",
        format!(
            "Serving echo agent on {}:{}{}",
            resolve_host(host.as_deref()),
            port,
            if debug { " (debug actions enabled)" } else { "" }
        )
        .green()
    );

    echo_app(debug, max_concurrent)
        .run(port, host.as_deref())
        .await
}

/// Agent that answers with what it was sent.
///
/// `{"stream": true, "prompt": "a b c"}` streams the prompt back word by
/// word; `{"fail": "message"}` raises a handler error; `{"sleep_ms": n}`
/// holds the invocation slot for `n` milliseconds first.
pub fn echo_app(debug: bool, max_concurrent: usize) -> AgentCoreApp {
    AgentCoreApp::builder()
        .debug(debug)
        .max_concurrent_invocations(max_concurrent)
        .entrypoint(|payload: Value, ctx| async move {
            if let Some(ms) = payload.get("sleep_ms").and_then(Value::as_u64) {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }

            if let Some(message) = payload.get("fail").and_then(Value::as_str) {
                return Err(HandlerError::new("EchoError", message));
            }

            if payload.get("stream").and_then(Value::as_bool) == Some(true) {
                let words: Vec<Result<Value, HandlerError>> = payload
                    .get("prompt")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(|w| Ok(json!({"token": w})))
                    .collect();
                return Ok(Invocation::stream(stream::iter(words)));
            }

            Ok(Invocation::Json(json!({
                "echo": payload,
                "session_id": ctx.session_id,
                "request_id": ctx.request_id,
            })))
        })
        .build()
}
