// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Health reported by `GET /ping`.
///
/// `HealthyBusy` tells the platform the agent is still working on background
/// tasks and should not be reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PingStatus {
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "HealthyBusy")]
    HealthyBusy,
}

impl PingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PingStatus::Healthy => "Healthy",
            PingStatus::HealthyBusy => "HealthyBusy",
        }
    }
}

impl fmt::Display for PingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Healthy" => Ok(PingStatus::Healthy),
            "HealthyBusy" => Ok(PingStatus::HealthyBusy),
            other => Err(format!("Unknown ping status '{}'", other)),
        }
    }
}

/// Body of `GET /ping` and of the `ping_status` debug action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: PingStatus,
    /// Unix seconds of the last status transition
    pub time_of_last_update: i64,
}
