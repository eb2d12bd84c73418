// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Bedrock AgentCore CLI

pub mod config;
pub mod debug;
pub mod identity;
pub mod invoke;
pub mod ping;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::identity::IdentityCommand;
pub use self::invoke::InvokeArgs;
pub use self::serve::ServeArgs;

/// Runtime address used when no `--url` is given.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";
