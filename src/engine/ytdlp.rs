//! yt-dlp backed fetch engine

use async_trait::async_trait;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use super::format::{FormatCandidate, StreamMode};
use super::traits::{FetchEngine, FetchRequest, ProgressCallback};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::types::{MediaInfo, ProgressEvent};

/// Prefix of the machine-readable progress lines requested via `--progress-template`
const PROGRESS_MARKER: &str = "[media-dl]";

/// Fields: status, downloaded bytes, total bytes, estimated total, speed, eta
const PROGRESS_TEMPLATE: &str = "download:[media-dl]%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress._speed_str)s|%(progress._eta_str)s";

/// Stderr lines kept for error reporting
const STDERR_TAIL: usize = 50;

/// Fetch engine driving an external `yt-dlp` binary
///
/// # Examples
///
/// ```no_run
/// use media_dl::engine::YtDlpEngine;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let engine = YtDlpEngine::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let engine = YtDlpEngine::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Clone, Debug)]
pub struct YtDlpEngine {
    binary_path: PathBuf,
    pot_provider_url: Option<String>,
    merge_format: String,
}

impl YtDlpEngine {
    /// Create an engine for an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            pot_provider_url: None,
            merge_format: "mp4".to_string(),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Build from configuration: the explicit path wins, then a PATH lookup
    /// if enabled. `None` means no usable binary is configured.
    pub fn from_config(config: &EngineConfig) -> Option<Self> {
        let engine = match &config.ytdlp_path {
            Some(path) => Self::new(path.clone()),
            None if config.search_path => Self::from_path()?,
            None => return None,
        };
        Some(
            engine
                .with_pot_provider(config.pot_provider_url.clone())
                .with_merge_format(config.merge_format.clone()),
        )
    }

    /// Pass a PO token provider base URL to the YouTube extractor
    pub fn with_pot_provider(mut self, url: Option<String>) -> Self {
        self.pot_provider_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    /// Container used when separate streams are merged
    pub fn with_merge_format(mut self, format: impl Into<String>) -> Self {
        self.merge_format = format.into();
        self
    }

    /// Path of the binary this engine runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn push_common_args(&self, args: &mut Vec<OsString>, credentials: Option<&Path>) {
        args.push("--no-playlist".into());
        args.push("--no-warnings".into());
        if let Some(url) = &self.pot_provider_url {
            args.push("--extractor-args".into());
            args.push(format!("youtube:getpot_bgutil_baseurl={url}").into());
        }
        if let Some(path) = credentials {
            args.push("--cookies".into());
            args.push(path.as_os_str().to_owned());
        }
    }

    pub(crate) fn probe_args(&self, url: &str, credentials: Option<&Path>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--dump-single-json".into(), "--skip-download".into()];
        self.push_common_args(&mut args, credentials);
        args.push("--".into());
        args.push(url.into());
        args
    }

    pub(crate) fn fetch_args(&self, request: &FetchRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--newline".into(),
            "--windows-filenames".into(),
            "--progress-template".into(),
            PROGRESS_TEMPLATE.into(),
            "-f".into(),
            selector(&request.candidate).into(),
            "-o".into(),
            request
                .output_dir
                .join("%(title)s.%(ext)s")
                .into_os_string(),
        ];
        self.push_common_args(&mut args, request.credentials.as_deref());

        if request.candidate.needs_merge() {
            args.push("--merge-output-format".into());
            args.push(self.merge_format.clone().into());
        }
        if let Some(transcode) = &request.transcode {
            args.push("-x".into());
            args.push("--audio-format".into());
            args.push(transcode.codec.clone().into());
            args.push("--audio-quality".into());
            args.push(format!("{}K", transcode.bitrate).into());
        }

        args.push("--".into());
        args.push(request.url.clone().into());
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> EngineError {
        EngineError::NotAvailable(format!(
            "failed to start {}: {}",
            self.binary_path.display(),
            e
        ))
    }
}

/// yt-dlp format selector for a candidate
pub(crate) fn selector(candidate: &FormatCandidate) -> String {
    match (candidate.mode, candidate.max_height) {
        (StreamMode::SeparateStreams, Some(h)) => format!("bestvideo[height<={h}]+bestaudio"),
        (StreamMode::SeparateStreams, None) => "bestvideo+bestaudio".to_string(),
        (StreamMode::Combined, Some(h)) => format!("best[height<={h}]"),
        (StreamMode::Combined, None) => "best".to_string(),
        (StreamMode::AudioOnly, _) => "bestaudio/best".to_string(),
    }
}

/// Parse one stdout line produced by the progress template.
///
/// Lines without the marker (yt-dlp's own status output) yield `None`.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
    if fields.len() != 6 {
        return None;
    }

    match fields[0] {
        "finished" => Some(ProgressEvent::Finished),
        "downloading" => Some(ProgressEvent::Downloading {
            downloaded_bytes: parse_bytes(fields[1]).unwrap_or(0),
            total_bytes: parse_bytes(fields[2]).or_else(|| parse_bytes(fields[3])),
            speed: advisory_text(fields[4]),
            eta: advisory_text(fields[5]),
        }),
        _ => None,
    }
}

// yt-dlp prints "NA" for missing fields; estimates are floats
fn parse_bytes(raw: &str) -> Option<u64> {
    let value: f64 = raw.parse().ok()?;
    (value.is_finite() && value > 0.0).then(|| value as u64)
}

fn advisory_text(raw: &str) -> String {
    match raw {
        "NA" | "None" | "Unknown" => String::new(),
        other => other.to_string(),
    }
}

/// Human-readable failure reason from the tail of stderr
pub(crate) fn failure_message(stderr: &[String], exit_code: Option<i32>) -> String {
    let last_error = stderr
        .iter()
        .rev()
        .find_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(str::trim);
    if let Some(message) = last_error.filter(|m| !m.is_empty()) {
        return message.to_string();
    }
    if let Some(line) = stderr.iter().rev().map(|l| l.trim()).find(|l| !l.is_empty()) {
        return line.to_string();
    }
    match exit_code {
        Some(code) => format!("yt-dlp exited with status {code}"),
        None => "yt-dlp was terminated by a signal".to_string(),
    }
}

/// Feed every output line to `on_line` until EOF or a read error.
///
/// Lines are decoded lossily: titles in a non-UTF-8 locale must not end the
/// read, or the child blocks on a closed pipe and later lines are lost.
async fn for_each_line<R, F>(reader: R, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(String),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\n', '\r']).to_string());
            }
            Err(e) => {
                tracing::debug!(error = %e, "stopped reading yt-dlp output");
                break;
            }
        }
    }
}

async fn collect_tail<R>(reader: R) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut tail = VecDeque::with_capacity(STDERR_TAIL);
    for_each_line(reader, |line| {
        if tail.len() == STDERR_TAIL {
            tail.pop_front();
        }
        tail.push_back(line);
    })
    .await;
    tail.into()
}

#[async_trait]
impl FetchEngine for YtDlpEngine {
    async fn probe(
        &self,
        url: &str,
        credentials: Option<&Path>,
    ) -> std::result::Result<MediaInfo, EngineError> {
        let output = Command::new(&self.binary_path)
            .args(self.probe_args(url, credentials))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr: Vec<String> = String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_string)
                .collect();
            let message = failure_message(&stderr, output.status.code());
            tracing::debug!(url, error = %message, "yt-dlp probe failed");
            return Err(EngineError::classify(message));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineError::Failed(format!("unreadable metadata from yt-dlp: {e}")))
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: ProgressCallback,
    ) -> std::result::Result<(), EngineError> {
        let mut child = Command::new(&self.binary_path)
            .args(self.fetch_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stderr_task = child.stderr.take().map(|s| tokio::spawn(collect_tail(s)));

        if let Some(stdout) = child.stdout.take() {
            for_each_line(stdout, |line| {
                if let Some(event) = parse_progress_line(&line) {
                    progress(event);
                }
            })
            .await;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineError::Failed(format!("failed to wait for yt-dlp: {e}")))?;
        let stderr = match stderr_task {
            Some(handle) => handle.await.unwrap_or_default(),
            None => Vec::new(),
        };

        if status.success() {
            Ok(())
        } else {
            Err(EngineError::classify(failure_message(&stderr, status.code())))
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
