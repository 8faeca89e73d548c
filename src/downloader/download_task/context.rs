//! Download task context - everything a spawned download needs.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::engine::FetchEngine;
use crate::registry::TaskRegistry;
use crate::types::{FormatKind, TaskId, TaskStatus, TaskUpdate};

/// Owned state for one download; moved into the spawned task.
pub(crate) struct DownloadTaskContext {
    pub(crate) id: TaskId,
    pub(crate) url: String,
    pub(crate) kind: FormatKind,
    pub(crate) quality: u32,
    pub(crate) task_dir: PathBuf,
    pub(crate) config: Arc<Config>,
    pub(crate) registry: Arc<TaskRegistry>,
    pub(crate) engine: Arc<dyn FetchEngine>,
    pub(crate) credentials: Arc<CredentialStore>,
}

impl DownloadTaskContext {
    /// Record a terminal failure. Ignored if the task already finished or
    /// was removed.
    pub(crate) fn mark_failed(&self, message: &str) {
        self.registry.update(&self.id, TaskUpdate::failed(message));
    }

    /// Replace the user-facing message
    pub(crate) fn set_message(&self, message: impl Into<String>) {
        self.registry.update(&self.id, TaskUpdate::message(message));
    }

    /// Whether the task was cancelled or is gone from the registry
    pub(crate) fn is_abandoned(&self) -> bool {
        self.registry
            .get(&self.id)
            .is_none_or(|task| task.status == TaskStatus::Cancelled)
    }
}
