// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Pure types shared by the runtime server, the identity service and the CLI.
//! Nothing in here performs I/O except configuration file loading.

pub mod config;
pub mod context;
pub mod identity;
pub mod invocation;
pub mod ping;
pub mod security;
pub mod task;

pub use context::{AgentCoreContext, RequestContext};
pub use invocation::{HandlerError, Invocation, InvocationError, StreamChunk};
pub use ping::{PingResponse, PingStatus};
