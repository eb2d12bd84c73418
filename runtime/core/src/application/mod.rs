// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod app;
pub mod identity;
pub mod task_tracker;

pub use app::{AgentCoreApp, AgentCoreAppBuilder, DEFAULT_MAX_CONCURRENT_INVOCATIONS};
pub use identity::IdentityClient;
pub use task_tracker::{AsyncTaskTracker, TaskGuard};
