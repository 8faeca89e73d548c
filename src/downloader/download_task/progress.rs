//! Progress events applied to the task registry.
//!
//! The hook is the single place where engine-side progress touches task
//! state, so it is also where cancellation is enforced for an attempt that
//! is already running.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::engine::ProgressCallback;
use crate::registry::TaskRegistry;
use crate::types::{ProgressEvent, TaskId, TaskStatus, TaskUpdate};

/// Highest percentage reported before the artifact is ready
pub(crate) const MAX_IN_FLIGHT_PERCENT: u8 = 99;

#[derive(Clone)]
pub(crate) struct ProgressHook {
    registry: Arc<TaskRegistry>,
    id: TaskId,
}

impl ProgressHook {
    pub(crate) fn new(registry: Arc<TaskRegistry>, id: TaskId) -> Self {
        Self { registry, id }
    }

    /// Apply an event; never panics into the engine's reader loop.
    pub(crate) fn handle(&self, event: ProgressEvent) {
        if std::panic::catch_unwind(AssertUnwindSafe(|| self.apply(event))).is_err() {
            tracing::warn!(task_id = %self.id, "progress update panicked, event dropped");
        }
    }

    fn apply(&self, event: ProgressEvent) {
        let Some(task) = self.registry.get(&self.id) else {
            return;
        };
        if task.status == TaskStatus::Cancelled {
            return;
        }

        let update = match event {
            ProgressEvent::Downloading {
                downloaded_bytes,
                total_bytes,
                speed,
                eta,
            } => TaskUpdate {
                status: Some(TaskStatus::Downloading),
                percent: Some(percent_of(downloaded_bytes, total_bytes).max(task.percent)),
                speed: Some(speed),
                eta: Some(eta),
                ..Default::default()
            },
            ProgressEvent::Finished => TaskUpdate {
                status: Some(TaskStatus::Processing),
                percent: Some(MAX_IN_FLIGHT_PERCENT),
                speed: Some(String::new()),
                eta: Some(String::new()),
                message: Some("processing".to_string()),
                ..Default::default()
            },
        };
        self.registry.update(&self.id, update);
    }

    pub(crate) fn into_callback(self) -> ProgressCallback {
        Arc::new(move |event| self.handle(event))
    }
}

/// `floor(downloaded / total * 100)` capped at 99; 0 when the total is unknown.
pub(crate) fn percent_of(downloaded: u64, total: Option<u64>) -> u8 {
    match total {
        Some(total) if total > 0 => {
            let pct = u128::from(downloaded) * 100 / u128::from(total);
            pct.min(u128::from(MAX_IN_FLIGHT_PERCENT)) as u8
        }
        _ => 0,
    }
}
