// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity service adapters
//!
//! HTTP transport for the AgentCore Identity service: endpoint resolution,
//! AWS Signature V4 request signing, the REST-JSON client and the default
//! authorization poller.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Implements the domain `IdentityApi` and `TokenPoller` seams

pub mod endpoints;
pub mod http;
pub mod poller;
pub mod sigv4;

pub use endpoints::IdentityEndpoints;
pub use http::HttpIdentityApi;
pub use poller::DefaultApiTokenPoller;
pub use sigv4::{AwsCredentials, SigV4Signer};
