//! Traits and types shared by fetch engines

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::format::{AudioTranscode, FormatCandidate};
use crate::error::EngineError;
use crate::types::{MediaInfo, ProgressEvent};

/// Synchronous progress sink invoked from the engine's output reader.
///
/// Implementations must return quickly; the engine does not read further
/// output until the callback returns.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// One download attempt
#[derive(Clone, Debug)]
pub struct FetchRequest {
    /// Source URL
    pub url: String,
    /// Format to try
    pub candidate: FormatCandidate,
    /// Directory the artifact is written to
    pub output_dir: PathBuf,
    /// Per-attempt credential copy, if any
    pub credentials: Option<PathBuf>,
    /// Post-download audio extraction, for audio requests
    pub transcode: Option<AudioTranscode>,
}

/// Capability interface for a media fetch tool
///
/// # Examples
///
/// ```no_run
/// use media_dl::engine::{FetchEngine, YtDlpEngine};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = YtDlpEngine::from_path().expect("yt-dlp not found in PATH");
/// let info = engine.probe("https://youtu.be/dQw4w9WgXcQ", None).await?;
/// println!("{:?}", info.title);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Fetch metadata without downloading
    async fn probe(
        &self,
        url: &str,
        credentials: Option<&Path>,
    ) -> std::result::Result<MediaInfo, EngineError>;

    /// Download one candidate into `request.output_dir`.
    ///
    /// Progress is reported through `progress` as it happens. Failures that
    /// are caused by authentication or bot detection must be reported as
    /// [`EngineError::Auth`].
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressCallback,
    ) -> std::result::Result<(), EngineError>;

    /// Short identifier for logs
    fn name(&self) -> &'static str;
}
