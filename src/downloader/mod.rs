//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`tasks`] - Request validation, admission and progress lookup
//! - [`control`] - Cooperative cancellation
//! - [`info`] - Metadata lookup without downloading
//! - [`download_task`] - Format-fallback download execution
//! - [`transfer`] - Opening finished artifacts for streaming
//! - [`cleanup`] - TTL sweep and post-transfer removal
//! - [`services`] - Background service starters

mod cleanup;
mod control;
mod download_task;
mod info;
mod services;
mod tasks;
mod transfer;
mod validation;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use cleanup::CleanupScheduler;
pub use info::MediaSummary;
pub use transfer::{Artifact, content_type_for};

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::engine::{FetchEngine, UnavailableEngine, YtDlpEngine};
use crate::error::{Error, Result};
use crate::registry::TaskRegistry;
use crate::types::TaskId;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Task records shared by handlers, download tasks and the sweeper
    pub(crate) registry: Arc<TaskRegistry>,
    /// Fetch engine (trait object for pluggable implementations)
    pub(crate) engine: Arc<dyn FetchEngine>,
    /// Credential source copied into task directories
    pub(crate) credentials: Arc<CredentialStore>,
    /// Cancelled on shutdown; stops background services
    pub(crate) shutdown: CancellationToken,
}

impl MediaDownloader {
    /// Create a new MediaDownloader instance
    ///
    /// Picks the yt-dlp engine (explicit path, then PATH lookup) and falls
    /// back to [`UnavailableEngine`] when no binary is found, so the server
    /// still starts and reports the problem per request.
    pub async fn new(config: Config) -> Result<Self> {
        let engine: Arc<dyn FetchEngine> = match YtDlpEngine::from_config(&config.engine) {
            Some(engine) => {
                tracing::info!(path = %engine.binary_path().display(), "using yt-dlp fetch engine");
                Arc::new(engine)
            }
            None => {
                tracing::warn!("yt-dlp not found, downloads will fail until it is installed");
                Arc::new(UnavailableEngine)
            }
        };

        Self::with_engine(config, engine).await
    }

    /// Create a MediaDownloader with an explicit fetch engine
    pub async fn with_engine(config: Config, engine: Arc<dyn FetchEngine>) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.temp_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create temp directory '{}': {}",
                        config.download.temp_dir.display(),
                        e
                    ),
                ))
            })?;

        let credentials = CredentialStore::from_config(&config.credentials);

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(TaskRegistry::new()),
            engine,
            credentials: Arc::new(credentials),
            shutdown: CancellationToken::new(),
        })
    }

    /// Replace the credential source
    pub fn with_credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Arc::new(credentials);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Shared task registry
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Name of the fetch engine in use
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Working directory of a task
    pub(crate) fn task_dir(&self, id: &TaskId) -> PathBuf {
        self.config.download.temp_dir.join(id.as_str())
    }

    /// Stop background services (the cleanup sweeper)
    ///
    /// Running downloads are not interrupted; they finish on their own.
    pub fn shutdown(&self) {
        tracing::info!("Stopping background services");
        self.shutdown.cancel();
    }

    /// Spawn the API server in a background task
    ///
    /// # Example
    ///
    /// ```no_run
    /// use media_dl::{MediaDownloader, Config};
    /// use std::sync::Arc;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = Arc::new(MediaDownloader::new(Config::default()).await?);
    ///     let handle = downloader.spawn_api_server();
    ///     handle.await??;
    ///     Ok(())
    /// }
    /// ```
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
