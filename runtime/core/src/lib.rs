// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bedrock AgentCore core
//!
//! Hosts user agent code behind the AgentCore runtime HTTP contract and
//! vends workload credentials through the AgentCore Identity service.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, application services, AWS adapters and the HTTP surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::app::{AgentCoreApp, AgentCoreAppBuilder};
pub use application::identity::IdentityClient;
pub use domain::*;
