//! Engine used when no fetch tool is installed

use async_trait::async_trait;
use std::path::Path;

use super::traits::{FetchEngine, FetchRequest, ProgressCallback};
use crate::error::EngineError;
use crate::types::MediaInfo;

/// Engine that fails every call with [`EngineError::NotAvailable`]
///
/// Lets the server start without `yt-dlp`; requests then fail with a clear
/// message instead of the process refusing to boot.
pub struct UnavailableEngine;

const HINT: &str = "yt-dlp binary not found. Configure ytdlp_path or ensure yt-dlp is in PATH.";

#[async_trait]
impl FetchEngine for UnavailableEngine {
    async fn probe(
        &self,
        _url: &str,
        _credentials: Option<&Path>,
    ) -> std::result::Result<MediaInfo, EngineError> {
        Err(EngineError::NotAvailable(HINT.into()))
    }

    async fn fetch(
        &self,
        _request: &FetchRequest,
        _progress: ProgressCallback,
    ) -> std::result::Result<(), EngineError> {
        Err(EngineError::NotAvailable(HINT.into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FormatCandidate, StreamMode};
    use std::sync::Arc;

    #[tokio::test]
    async fn every_call_reports_not_available() {
        let engine = UnavailableEngine;
        let probe = engine.probe("https://youtu.be/x", None).await;
        assert!(matches!(probe, Err(EngineError::NotAvailable(_))));

        let request = FetchRequest {
            url: "https://youtu.be/x".into(),
            candidate: FormatCandidate {
                max_height: None,
                mode: StreamMode::Combined,
            },
            output_dir: std::env::temp_dir(),
            credentials: None,
            transcode: None,
        };
        let fetch = engine.fetch(&request, Arc::new(|_| {})).await;
        assert!(matches!(fetch, Err(EngineError::NotAvailable(_))));
        assert_eq!(engine.name(), "unavailable");
    }
}
