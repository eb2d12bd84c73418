// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod api;
pub mod server;

pub use api::router;
pub use server::{resolve_host, running_in_container, DEFAULT_PORT};
