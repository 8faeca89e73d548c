//! Shared test helpers: a scripted fetch engine and downloader construction.

use crate::config::{Config, CredentialConfig};
use crate::credentials::CredentialStore;
use crate::downloader::MediaDownloader;
use crate::engine::{FetchEngine, FetchRequest, ProgressCallback};
use crate::error::EngineError;
use crate::types::{FormatInfo, MediaInfo, ProgressEvent, Task, TaskId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Notify;

/// Contents of the credential secret used by test downloaders
pub(crate) const TEST_CREDENTIALS: &str = "# Netscape HTTP Cookie File\n";

/// What the scripted engine does for one fetch call
pub(crate) struct Step {
    pub(crate) events_before: Vec<ProgressEvent>,
    pub(crate) wait_for_release: bool,
    pub(crate) events_after: Vec<ProgressEvent>,
    pub(crate) outcome: Result<Vec<(String, usize)>, EngineError>,
}

impl Step {
    /// Succeed after writing the given files
    pub(crate) fn succeed(files: &[(&str, usize)]) -> Self {
        Self {
            events_before: Vec::new(),
            wait_for_release: false,
            events_after: Vec::new(),
            outcome: Ok(files
                .iter()
                .map(|(name, size)| (name.to_string(), *size))
                .collect()),
        }
    }

    /// Fail after leaving a partial file behind
    pub(crate) fn fail(error: EngineError) -> Self {
        Self {
            events_before: Vec::new(),
            wait_for_release: false,
            events_after: Vec::new(),
            outcome: Err(error),
        }
    }

    pub(crate) fn with_events(mut self, events: Vec<ProgressEvent>) -> Self {
        self.events_before = events;
        self
    }

    /// Block after `events_before` until [`ScriptedEngine::release`] is called
    pub(crate) fn gated(mut self, events_after: Vec<ProgressEvent>) -> Self {
        self.wait_for_release = true;
        self.events_after = events_after;
        self
    }
}

/// One recorded fetch call
#[derive(Clone, Debug)]
pub(crate) struct Attempt {
    pub(crate) request: FetchRequest,
    /// Non-credential files present in the output directory when the attempt began
    pub(crate) files_present: Vec<String>,
}

/// In-process [`FetchEngine`] following a fixed script
pub(crate) struct ScriptedEngine {
    probe: Result<MediaInfo, EngineError>,
    steps: Mutex<VecDeque<Step>>,
    attempts: Mutex<Vec<Attempt>>,
    gate: Notify,
}

impl ScriptedEngine {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            probe: Ok(sample_info()),
            steps: Mutex::new(steps.into()),
            attempts: Mutex::new(Vec::new()),
            gate: Notify::new(),
        }
    }

    pub(crate) fn with_probe(mut self, probe: Result<MediaInfo, EngineError>) -> Self {
        self.probe = probe;
        self
    }

    pub(crate) fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    /// Let a gated step continue
    pub(crate) fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl FetchEngine for ScriptedEngine {
    async fn probe(
        &self,
        _url: &str,
        _credentials: Option<&Path>,
    ) -> Result<MediaInfo, EngineError> {
        self.probe.clone()
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressCallback,
    ) -> Result<(), EngineError> {
        let attempt_no = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(Attempt {
                request: request.clone(),
                files_present: output_files(&request.output_dir),
            });
            attempts.len()
        };
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::fail(EngineError::Failed("no scripted step left".into())));

        for event in step.events_before {
            progress(event);
        }
        if step.wait_for_release {
            self.gate.notified().await;
        }
        for event in step.events_after {
            progress(event);
        }

        match step.outcome {
            Ok(files) => {
                for (name, size) in files {
                    std::fs::write(request.output_dir.join(name), vec![7u8; size]).unwrap();
                }
                Ok(())
            }
            Err(e) => {
                std::fs::write(
                    request.output_dir.join(format!("partial-{attempt_no}.part")),
                    b"partial",
                )
                .unwrap();
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Probe result used unless a test overrides it
pub(crate) fn sample_info() -> MediaInfo {
    MediaInfo {
        title: Some("Test Video".to_string()),
        channel: None,
        uploader: Some("Test Uploader".to_string()),
        duration: Some(212.0),
        thumbnail: Some("https://i.ytimg.com/vi/abc/hq.jpg".to_string()),
        view_count: Some(1234),
        formats: vec![
            FormatInfo { height: Some(1080) },
            FormatInfo { height: Some(720) },
            FormatInfo { height: None },
        ],
    }
}

/// Sorted names of the non-credential files in `dir`
pub(crate) fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| !crate::credentials::is_credential_artifact(n))
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// Helper to create a test MediaDownloader around the given engine.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(
    engine: Arc<dyn FetchEngine>,
) -> (MediaDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let secret = temp_dir.path().join("cookies-secret.txt");
    std::fs::write(&secret, TEST_CREDENTIALS).unwrap();

    let mut config = Config::default();
    config.download.temp_dir = temp_dir.path().join("work");
    config.download.max_concurrent_downloads = 3;
    config.download.post_transfer_delay = Duration::from_millis(50);

    let credentials = CredentialStore::from_config(&CredentialConfig {
        secret_file: Some(secret),
        env_var: None,
    });
    let downloader = MediaDownloader::with_engine(config, engine)
        .await
        .unwrap()
        .with_credentials(credentials);
    (downloader, temp_dir)
}

/// Poll until `condition` holds, panicking after five seconds
pub(crate) async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Wait until the task reaches a terminal status and return it
pub(crate) async fn wait_for_terminal(downloader: &MediaDownloader, id: &TaskId) -> Task {
    wait_until("terminal status", || {
        downloader
            .registry
            .get(id)
            .is_some_and(|t| t.status.is_terminal())
    })
    .await;
    downloader.registry.get(id).unwrap()
}
