//! Expiry of finished tasks and their files.
//!
//! Two paths remove task artifacts:
//!
//! - the periodic [`CleanupScheduler`] sweep, which drops finished tasks
//!   older than `file_ttl`
//! - a delayed removal scheduled whenever a file is served
//!
//! Both go through [`MediaDownloader::remove_task_artifacts`], which is
//! idempotent, so it does not matter which one runs first.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::types::TaskId;

use super::MediaDownloader;

impl MediaDownloader {
    /// Delete a task's working directory, then its registry entry.
    ///
    /// Missing directories and entries are not errors; directory removal
    /// failures are logged and the entry is removed anyway.
    pub async fn remove_task_artifacts(&self, id: &TaskId) {
        let dir = self.task_dir(id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(task_id = %id, "removed task directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(task_id = %id, error = %e, "failed to remove task directory"),
        }
        self.registry.remove(id);
    }

    /// Run one sweep as of `now`, returning the number of tasks removed.
    ///
    /// Only tasks in `ready`, `error` or `cancelled` whose age exceeds
    /// `file_ttl` are removed; active tasks are never touched.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.config.download.file_ttl;
        let expired: Vec<TaskId> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|(_, task)| {
                task.status.is_terminal()
                    && (now - task.created_at)
                        .to_std()
                        .is_ok_and(|age| age > ttl)
            })
            .map(|(id, _)| id)
            .collect();

        for id in &expired {
            self.remove_task_artifacts(id).await;
        }
        expired.len()
    }

    /// Remove a task's files and record after `post_transfer_delay`.
    ///
    /// Scheduled when a file response is created; the delay leaves the
    /// transfer time to finish.
    pub fn schedule_post_transfer_cleanup(&self, id: TaskId) -> tokio::task::JoinHandle<()> {
        let downloader = self.clone();
        let delay = self.config.download.post_transfer_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            downloader.remove_task_artifacts(&id).await;
            debug!(task_id = %id, "post-transfer cleanup finished");
        })
    }
}

/// Background task that periodically sweeps expired tasks
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, MediaDownloader};
/// use media_dl::downloader::CleanupScheduler;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = MediaDownloader::new(Config::default()).await?;
/// let shutdown = CancellationToken::new();
/// let scheduler = CleanupScheduler::new(downloader, shutdown.clone());
///
/// let handle = tokio::spawn(scheduler.run());
/// shutdown.cancel();
/// handle.await?;
/// # Ok(())
/// # }
/// ```
pub struct CleanupScheduler {
    downloader: MediaDownloader,
    interval: Duration,
    shutdown: CancellationToken,
}

impl CleanupScheduler {
    /// Create a sweeper using the downloader's `cleanup_interval`
    pub fn new(downloader: MediaDownloader, shutdown: CancellationToken) -> Self {
        let interval = downloader.config.download.cleanup_interval;
        Self {
            downloader,
            interval,
            shutdown,
        }
    }

    /// Sweep every `interval` until `shutdown` is cancelled.
    ///
    /// A failing pass is logged and the loop keeps going.
    pub async fn run(self) {
        info!(
            interval_secs = self.interval.as_secs(),
            ttl_secs = self.downloader.config.download.file_ttl.as_secs(),
            "Cleanup scheduler started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Cleanup scheduler shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            match AssertUnwindSafe(self.downloader.sweep_at(Utc::now()))
                .catch_unwind()
                .await
            {
                Ok(0) => debug!("Cleanup pass found nothing to remove"),
                Ok(removed) => info!(removed, "Removed expired tasks"),
                Err(_) => error!("Cleanup pass panicked, will retry next interval"),
            }
        }

        info!("Cleanup scheduler stopped");
    }
}
