//! # media-dl
//!
//! Web front end for asynchronous media downloads.
//!
//! A client submits a media URL, receives a task id immediately and polls
//! progress while a background task fetches the media through an external
//! fetch engine (yt-dlp). The finished file is streamed back and removed a
//! short while later; unclaimed files expire after a configurable TTL.
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, MediaDownloader, run_server};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Arc::new(MediaDownloader::new(Config::default()).await?);
//!
//!     // Serves until SIGTERM / Ctrl+C
//!     run_server(downloader).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Credential provisioning for the fetch engine
pub mod credentials;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Fetch engine abstraction and the yt-dlp implementation
pub mod engine;
/// Error types
pub mod error;
/// In-memory task registry with admission control
pub mod registry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use downloader::{CleanupScheduler, MediaDownloader, MediaSummary};
pub use engine::{FetchEngine, YtDlpEngine};
pub use error::{ApiError, EngineError, Error, Result, ToHttpStatus};
pub use registry::TaskRegistry;
pub use types::{FormatKind, MediaInfo, ProgressEvent, Task, TaskId, TaskStatus};

/// Run the HTTP server and the cleanup sweeper until a termination signal.
///
/// On SIGTERM/SIGINT the downloader's `shutdown()` is called, which stops the
/// sweeper and lets the server drain in-flight requests.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_server(downloader: std::sync::Arc<MediaDownloader>) -> Result<()> {
    let sweeper = downloader.start_cleanup_scheduler();
    let mut server = downloader.spawn_api_server();

    let finished_early = tokio::select! {
        _ = wait_for_signal() => None,
        joined = &mut server => Some(joined),
    };
    downloader.shutdown();

    // After shutdown the server drains in-flight requests before returning
    let joined = match finished_early {
        Some(joined) => joined,
        None => server.await,
    };

    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "cleanup scheduler task ended abnormally");
    }

    joined.map_err(|e| Error::ApiServerError(e.to_string()))?
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
