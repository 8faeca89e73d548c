//! Download lifecycle control.

use crate::error::{Error, Result};
use crate::types::{TaskId, TaskStatus};

use super::MediaDownloader;

impl MediaDownloader {
    /// Cancel an active download
    ///
    /// Cancellation is cooperative: the task is marked `cancelled` at once,
    /// later progress callbacks are ignored, and the orchestrator stops before
    /// the next format attempt. An engine call already in flight runs to
    /// completion, after which the task's files are removed.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for unknown ids
    /// - [`Error::InvalidState`] if the task already finished
    pub fn cancel(&self, id: &TaskId) -> Result<TaskStatus> {
        match self.registry.cancel(id) {
            None => Err(Error::NotFound(id.to_string())),
            Some(previous) if previous.is_active() => {
                tracing::info!(task_id = %id, previous = %previous, "download cancelled");
                Ok(TaskStatus::Cancelled)
            }
            Some(previous) => Err(Error::InvalidState {
                id: id.to_string(),
                operation: "cancel".to_string(),
                status: previous.to_string(),
            }),
        }
    }
}
