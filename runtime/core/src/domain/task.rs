// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Identifier handed out when an async task is registered.
pub type TaskId = u64;

/// Background work the agent is doing outside of a request.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: String,
    pub started_at: Instant,
    pub metadata: Option<Value>,
}

impl TaskInfo {
    pub fn new(name: impl Into<String>, metadata: Option<Value>) -> Self {
        Self {
            name: name.into(),
            started_at: Instant::now(),
            metadata,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningJob {
    pub name: String,
    /// Seconds since the task was registered
    pub duration: f64,
}

/// Snapshot returned by the `job_status` debug action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncTaskInfo {
    pub active_count: usize,
    pub running_jobs: Vec<RunningJob>,
}
