//! Error types for media-dl
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error types (task lookup, admission, fetch engine, etc.)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "temp_dir")
        key: Option<String>,
    },

    /// Request rejected before any task was created (missing URL, unknown host, ...)
    #[error("{0}")]
    Validation(String),

    /// Admission control refused the request
    #[error("server is busy ({active} of {limit} downloads running), please try again later")]
    Busy {
        /// Number of tasks currently in an active status
        active: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// Unknown task identifier
    #[error("unknown task id: {0}")]
    NotFound(String),

    /// The task exists but has no artifact to serve yet
    #[error("file for task {id} is not ready (status: {status})")]
    NotReady {
        /// Task identifier
        id: String,
        /// Current status of the task
        status: String,
    },

    /// The task is ready but its artifact is gone (expired or cleaned up)
    #[error("file for task {id} not found, it may have expired")]
    FileMissing {
        /// Task identifier
        id: String,
        /// Path the artifact was expected at
        path: PathBuf,
    },

    /// Operation not valid for the task's current status
    #[error("cannot {operation} task {id} in status {status}")]
    InvalidState {
        /// Task identifier
        id: String,
        /// The operation that was attempted (e.g. "cancel")
        operation: String,
        /// The status that prevents the operation
        status: String,
    },

    /// Fetch engine failure (probe or download attempt)
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Metadata lookup for the info endpoint failed
    #[error("could not read media information: {0}")]
    Probe(EngineError),

    /// The engine reported success but no output file exists
    #[error("no output file was produced")]
    NoOutput,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by a [`FetchEngine`](crate::engine::FetchEngine)
///
/// The engine boundary classifies failures so the orchestrator can decide
/// whether trying another format candidate makes sense.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Authentication or bot-detection failure; retrying another format cannot help
    #[error("authentication required: {0}")]
    Auth(String),

    /// Any other failure of a probe or download attempt
    #[error("{0}")]
    Failed(String),

    /// The engine binary is missing or could not be started
    #[error("fetch engine unavailable: {0}")]
    NotAvailable(String),
}

/// Lowercase markers that identify sign-in / bot-check failures in free-text engine output
const AUTH_MARKERS: &[&str] = &["sign in", "bot"];

impl EngineError {
    /// Classify a free-text failure description.
    ///
    /// Substring matching against the engine's own wording is fragile across
    /// engine versions and locales; engines that can report a structured
    /// failure should construct [`EngineError::Auth`] directly.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if AUTH_MARKERS.iter().any(|marker| lower.contains(marker)) {
            EngineError::Auth(message)
        } else {
            EngineError::Failed(message)
        }
    }

    /// Whether this failure should stop the format fallback chain
    pub fn is_auth(&self) -> bool {
        matches!(self, EngineError::Auth(_))
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": "unknown task id: 3f2a...",
///   "code": "not_found"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable error message, suitable for displaying to end users
    pub error: String,

    /// Machine-readable error code (e.g., "not_found", "busy")
    pub code: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input, premature download)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,
            Error::NotReady { .. } => 400,
            Error::Probe(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::FileMissing { .. } => 404,

            // 409 Conflict
            Error::InvalidState { .. } => 409,

            // 429 Too Many Requests - admission control
            Error::Busy { .. } => 429,

            // 502 Bad Gateway - External engine errors (503 when the engine is missing)
            Error::Engine(EngineError::NotAvailable(_)) => 503,
            Error::Engine(_) => 502,

            // 500 Internal Server Error - Server-side issues
            Error::NoOutput => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Busy { .. } => "busy",
            Error::NotFound(_) => "not_found",
            Error::NotReady { .. } => "not_ready",
            Error::FileMissing { .. } => "file_missing",
            Error::InvalidState { .. } => "invalid_state",
            Error::Engine(e) => match e {
                EngineError::Auth(_) => "engine_auth_error",
                EngineError::Failed(_) => "engine_error",
                EngineError::NotAvailable(_) => "engine_unavailable",
            },
            Error::Probe(_) => "probe_failed",
            Error::NoOutput => "no_output",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Busy { active, limit } => Some(serde_json::json!({
                "active": active,
                "limit": limit,
            })),
            Error::NotReady { id, status } => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            Error::InvalidState { id, status, .. } => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            _ => None,
        };

        ApiError {
            error: message,
            code,
            details,
        }
    }
}
