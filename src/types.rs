//! Core types for media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Unique identifier for a download task
///
/// 128 random bits rendered as 32 lowercase hex characters. The id doubles as
/// the name of the task's working directory, so it never contains path
/// separators.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    /// Borrow the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `raw` has the shape of a generated identifier
    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == 32 && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for TaskId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Admitted, probing metadata
    Starting,
    /// Fetch engine is transferring bytes
    Downloading,
    /// Transfer finished, engine is merging / transcoding
    Processing,
    /// Artifact is on disk and can be served
    Ready,
    /// Failed with error
    Error,
    /// Cancelled by the user
    Cancelled,
}

impl TaskStatus {
    /// Whether the status counts against the concurrency ceiling
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskStatus::Starting | TaskStatus::Downloading | TaskStatus::Processing
        )
    }

    /// Whether no further updates are expected for the task
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Starting => "starting",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Processing => "processing",
            TaskStatus::Ready => "ready",
            TaskStatus::Error => "error",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested output kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Video with audio (default)
    #[default]
    Video,
    /// Audio only, transcoded to the configured codec
    Audio,
}

impl std::str::FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "video" => Ok(FormatKind::Video),
            "audio" => Ok(FormatKind::Audio),
            other => Err(format!("unsupported format '{}', expected 'video' or 'audio'", other)),
        }
    }
}

/// One user-initiated download and its mutable progress/result state
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    /// Lifecycle status
    pub status: TaskStatus,
    /// Progress percentage (0-100, capped at 99 until ready)
    pub percent: u8,
    /// Advisory transfer speed, as reported by the engine
    pub speed: String,
    /// Advisory time remaining, as reported by the engine
    pub eta: String,
    /// User-facing status message
    pub message: String,
    /// Media title (after the metadata probe)
    pub title: String,
    /// Channel or uploader name (after the metadata probe)
    pub channel: String,
    /// Source URL
    pub url: String,
    /// Requested output kind
    pub format_kind: FormatKind,
    /// Requested maximum video height
    pub quality: u32,
    /// Creation time, used for TTL expiry
    pub created_at: DateTime<Utc>,
    /// Path of the finished artifact
    pub filepath: Option<PathBuf>,
    /// File name of the finished artifact
    pub filename: Option<String>,
    /// Size of the finished artifact in bytes
    pub filesize: Option<u64>,
}

impl Task {
    /// Create a task in the `starting` state
    pub fn new(url: impl Into<String>, format_kind: FormatKind, quality: u32) -> Self {
        Self {
            status: TaskStatus::Starting,
            percent: 0,
            speed: String::new(),
            eta: String::new(),
            message: "starting download...".to_string(),
            title: String::new(),
            channel: String::new(),
            url: url.into(),
            format_kind,
            quality,
            created_at: Utc::now(),
            filepath: None,
            filename: None,
            filesize: None,
        }
    }

    /// Apply the `Some` fields of an update
    pub(crate) fn merge(&mut self, update: TaskUpdate) {
        let TaskUpdate {
            status,
            percent,
            speed,
            eta,
            message,
            title,
            channel,
            filepath,
            filename,
            filesize,
        } = update;

        if let Some(status) = status {
            self.status = status;
        }
        if let Some(percent) = percent {
            self.percent = percent.min(100);
        }
        if let Some(speed) = speed {
            self.speed = speed;
        }
        if let Some(eta) = eta {
            self.eta = eta;
        }
        if let Some(message) = message {
            self.message = message;
        }
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(channel) = channel {
            self.channel = channel;
        }
        if filepath.is_some() {
            self.filepath = filepath;
        }
        if filename.is_some() {
            self.filename = filename;
        }
        if filesize.is_some() {
            self.filesize = filesize;
        }
    }
}

/// Partial update merged into a [`Task`] under the registry lock
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskUpdate {
    /// New status
    pub status: Option<TaskStatus>,
    /// New percentage
    pub percent: Option<u8>,
    /// New speed string
    pub speed: Option<String>,
    /// New ETA string
    pub eta: Option<String>,
    /// New message
    pub message: Option<String>,
    /// Media title
    pub title: Option<String>,
    /// Channel or uploader name
    pub channel: Option<String>,
    /// Finished artifact path
    pub filepath: Option<PathBuf>,
    /// Finished artifact name
    pub filename: Option<String>,
    /// Finished artifact size
    pub filesize: Option<u64>,
}

impl TaskUpdate {
    /// Update that only replaces the message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Terminal failure with a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Error),
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Progress notification pushed by a fetch engine during an attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Bytes are being transferred
    Downloading {
        /// Bytes received so far
        downloaded_bytes: u64,
        /// Exact or estimated total, if known
        total_bytes: Option<u64>,
        /// Human-readable speed
        speed: String,
        /// Human-readable time remaining
        eta: String,
    },
    /// The transfer finished; post-processing (merge/transcode) follows
    Finished,
}

/// Metadata returned by a probe
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MediaInfo {
    /// Media title
    #[serde(default)]
    pub title: Option<String>,
    /// Channel name
    #[serde(default)]
    pub channel: Option<String>,
    /// Uploader name, used when the channel is missing
    #[serde(default)]
    pub uploader: Option<String>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// View count
    #[serde(default)]
    pub view_count: Option<u64>,
    /// Available formats
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

impl MediaInfo {
    /// Channel name, falling back to the uploader
    pub fn channel_or_uploader(&self) -> Option<&str> {
        self.channel.as_deref().or(self.uploader.as_deref())
    }
}

/// A single format entry of a probe result
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FormatInfo {
    /// Video height, absent for audio-only formats
    #[serde(default)]
    pub height: Option<u32>,
}

/// Selectable quality for the front end
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QualityOption {
    /// Height as a string (e.g. "1080")
    pub value: String,
    /// Display label (e.g. "1080p")
    pub label: String,
}

impl QualityOption {
    /// Quality option for a given height
    pub fn from_height(height: u32) -> Self {
        Self {
            value: height.to_string(),
            label: format!("{}p", height),
        }
    }
}
