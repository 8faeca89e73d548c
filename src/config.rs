//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Download behavior configuration (directories, concurrency, expiry)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Base directory holding one working directory per task
    /// (default: `<system temp>/media-dl`)
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Maximum simultaneously active downloads (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Age after which finished tasks and their files are swept (default: 30 minutes)
    #[serde(with = "duration_serde", default = "default_file_ttl")]
    #[schema(value_type = u64)]
    pub file_ttl: Duration,

    /// Interval between TTL sweeps (default: 5 minutes)
    #[serde(with = "duration_serde", default = "default_cleanup_interval")]
    #[schema(value_type = u64)]
    pub cleanup_interval: Duration,

    /// Grace period between serving a file and deleting it (default: 120 seconds)
    #[serde(with = "duration_serde", default = "default_post_transfer_delay")]
    #[schema(value_type = u64)]
    pub post_transfer_delay: Duration,

    /// Media longer than this is flagged `too_long` by the info endpoint (default: 2 hours)
    ///
    /// Advisory only; downloads of longer media are not blocked.
    #[serde(with = "duration_serde", default = "default_max_duration")]
    #[schema(value_type = u64)]
    pub max_duration: Duration,

    /// Video height used when a request does not specify one (default: 1080)
    #[serde(default = "default_quality")]
    pub default_quality: u32,

    /// Hosts accepted by URL validation; subdomains match too
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            max_concurrent_downloads: default_max_concurrent(),
            file_ttl: default_file_ttl(),
            cleanup_interval: default_cleanup_interval(),
            post_transfer_delay: default_post_transfer_delay(),
            max_duration: default_max_duration(),
            default_quality: default_quality(),
            allowed_hosts: default_allowed_hosts(),
        }
    }
}

/// Fetch engine settings (yt-dlp binary and output options)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EngineConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Base URL of a PO token provider passed to the YouTube extractor, if any
    #[serde(default = "default_pot_provider_url")]
    pub pot_provider_url: Option<String>,

    /// Codec audio requests are transcoded to (default: "mp3")
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Bitrate in kbit/s for audio transcoding (default: "192")
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Container used when separate video and audio streams are merged (default: "mp4")
    #[serde(default = "default_merge_format")]
    pub merge_format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
            pot_provider_url: default_pot_provider_url(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            merge_format: default_merge_format(),
        }
    }
}

/// Where the fetch engine's credential blob comes from
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialConfig {
    /// Mounted secret file copied for every attempt (default: /etc/secrets/cookies.txt)
    #[serde(default = "default_secret_file")]
    pub secret_file: Option<PathBuf>,

    /// Environment variable holding the blob when the secret file is absent
    /// (default: YOUTUBE_COOKIES)
    #[serde(default = "default_credential_env_var")]
    pub env_var: Option<String>,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            secret_file: default_secret_file(),
            env_var: default_credential_env_var(),
        }
    }
}

/// Main configuration for MediaDownloader
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) - directories, concurrency, expiry
/// - [`engine`](EngineConfig) - yt-dlp binary and output options
/// - [`credentials`](CredentialConfig) - credential blob source
/// - [`server`](ServerIntegrationConfig) - HTTP API
///
/// Sub-config fields are flattened, so the JSON format has no nesting apart
/// from `api`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Fetch engine settings
    #[serde(flatten)]
    pub engine: EngineConfig,

    /// Credential source
    #[serde(flatten)]
    pub credentials: CredentialConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Base directory for task working directories
    pub fn temp_dir(&self) -> &PathBuf {
        &self.download.temp_dir
    }

    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".to_string(),
                key: Some("max_concurrent_downloads".to_string()),
            });
        }
        if self.download.cleanup_interval.is_zero() {
            return Err(Error::Config {
                message: "cleanup_interval must be greater than zero".to_string(),
                key: Some("cleanup_interval".to_string()),
            });
        }
        if self.download.default_quality == 0 {
            return Err(Error::Config {
                message: "default_quality must be a positive height".to_string(),
                key: Some("default_quality".to_string()),
            });
        }
        if self.download.allowed_hosts.is_empty() {
            return Err(Error::Config {
                message: "allowed_hosts must list at least one host".to_string(),
                key: Some("allowed_hosts".to_string()),
            });
        }
        Ok(())
    }
}

/// Server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("media-dl")
}

fn default_max_concurrent() -> usize {
    3
}

fn default_file_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_post_transfer_delay() -> Duration {
    Duration::from_secs(120)
}

fn default_max_duration() -> Duration {
    Duration::from_secs(2 * 60 * 60)
}

fn default_quality() -> u32 {
    1080
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["youtube.com".to_string(), "youtu.be".to_string()]
}

fn default_pot_provider_url() -> Option<String> {
    Some("http://127.0.0.1:4416".to_string())
}

fn default_audio_codec() -> String {
    "mp3".to_string()
}

fn default_audio_bitrate() -> String {
    "192".to_string()
}

fn default_merge_format() -> String {
    "mp4".to_string()
}

fn default_secret_file() -> Option<PathBuf> {
    Some(PathBuf::from("/etc/secrets/cookies.txt"))
}

fn default_credential_env_var() -> Option<String> {
    Some("YOUTUBE_COOKIES".to_string())
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
