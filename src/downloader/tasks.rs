//! Task admission, spawning and progress lookup.

use crate::error::{Error, Result};
use crate::registry::Admission;
use crate::types::{FormatKind, Task, TaskId};

use super::MediaDownloader;
use super::download_task::{DownloadTaskContext, run_download_task};
use super::validation::{parse_quality, validate_url};

impl MediaDownloader {
    /// Validate a download request, admit it and start it in the background
    ///
    /// Validation runs first and never touches the registry. Admission counts
    /// active tasks and inserts the new record under one lock, so concurrent
    /// requests cannot overshoot `max_concurrent_downloads`. Returns the new
    /// task id; the download itself continues after this returns.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn prepare(&self, url: &str, format: &str, quality: &str) -> Result<TaskId> {
        let url = validate_url(url, &self.config.download.allowed_hosts)?;
        let kind: FormatKind = format.parse().map_err(Error::Validation)?;
        let quality = parse_quality(quality, self.config.download.default_quality)?;

        let id = TaskId::generate();
        let limit = self.config.download.max_concurrent_downloads;
        let task = Task::new(url.clone(), kind, quality);

        if let Admission::Busy { active, limit } = self.registry.admit(id.clone(), task, limit) {
            tracing::warn!(active, limit, "rejecting download request, server is busy");
            return Err(Error::Busy { active, limit });
        }

        tracing::info!(
            task_id = %id,
            url = %url,
            format = ?kind,
            quality,
            "download task admitted"
        );

        let ctx = DownloadTaskContext {
            id: id.clone(),
            url,
            kind,
            quality,
            task_dir: self.task_dir(&id),
            config: self.config.clone(),
            registry: self.registry.clone(),
            engine: self.engine.clone(),
            credentials: self.credentials.clone(),
        };
        tokio::spawn(run_download_task(ctx));

        Ok(id)
    }

    /// Snapshot of a task's current state
    pub fn progress(&self, id: &TaskId) -> Result<Task> {
        self.registry
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}
