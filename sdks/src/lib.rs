// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

/// Bedrock AgentCore Rust SDK
///
/// Call agents that speak the AgentCore runtime contract: invoke them, follow
/// their streamed responses and check their health.

pub mod client;
pub mod sse;
pub mod types;

pub use client::AgentCoreClient;
pub use types::*;
