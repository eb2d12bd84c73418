// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::task::{AsyncTaskInfo, RunningJob, TaskId, TaskInfo};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Registry of background tasks that keep the agent busy.
///
/// While any task is registered the automatic ping status is `HealthyBusy`.
#[derive(Debug)]
pub struct AsyncTaskTracker {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<TaskId, TaskInfo>>,
}

impl AsyncTaskTracker {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Register a task and return the id needed to complete it.
    pub fn add(&self, name: &str, metadata: Option<Value>) -> TaskId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.tasks.lock().insert(id, TaskInfo::new(name, metadata));
        info!("Async task started: {} (ID: {})", name, id);
        id
    }

    /// Returns false when `id` is not (or no longer) registered.
    pub fn complete(&self, id: TaskId) -> bool {
        let removed = self.tasks.lock().remove(&id);
        match removed {
            Some(task) => {
                info!(
                    "Async task completed: {} (ID: {}, Duration: {:.2}s)",
                    task.name,
                    id,
                    task.elapsed_secs()
                );
                true
            }
            None => {
                warn!("Attempted to complete unknown task ID: {}", id);
                false
            }
        }
    }

    /// Register a task that completes itself when the guard is dropped.
    pub fn start(&self, name: &str, metadata: Option<Value>) -> TaskGuard<'_> {
        let id = self.add(name, metadata);
        TaskGuard { tracker: self, id }
    }

    pub fn active_count(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_busy(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    pub fn info(&self) -> AsyncTaskInfo {
        let tasks = self.tasks.lock();
        AsyncTaskInfo {
            active_count: tasks.len(),
            running_jobs: tasks
                .values()
                .map(|t| RunningJob {
                    name: t.name.clone(),
                    duration: t.elapsed_secs(),
                })
                .collect(),
        }
    }
}

impl Default for AsyncTaskTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Completes its task on drop, including on early return or panic.
#[must_use = "the task completes as soon as the guard is dropped"]
pub struct TaskGuard<'a> {
    tracker: &'a AsyncTaskTracker,
    id: TaskId,
}

impl TaskGuard<'_> {
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.tracker.complete(self.id);
    }
}
