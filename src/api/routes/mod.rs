//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Prepare, poll, cancel and download
//! - [`info`] - Metadata lookup
//! - [`system`] - Front-end page, health, OpenAPI

use crate::error::Error;
use crate::types::{Task, TaskStatus};
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

mod info;
mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` works from the router
pub use info::*;
pub use system::*;
pub use tasks::*;

// ============================================================================
// Request Types
// ============================================================================

/// Request body for POST /api/info
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct InfoRequest {
    /// Media page URL
    #[serde(default)]
    pub url: String,
}

/// Request body for POST /api/prepare
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PrepareRequest {
    /// Media page URL
    #[serde(default)]
    pub url: String,
    /// "video" (default) or "audio"
    #[serde(default)]
    pub format: Option<String>,
    /// Maximum height, as a number or a string such as "720" (default 1080)
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "720")]
    pub quality: Option<serde_json::Value>,
}

impl PrepareRequest {
    /// The quality field as text, accepting JSON numbers and strings
    pub(crate) fn quality_text(&self) -> Result<String, Error> {
        match &self.quality {
            None | Some(serde_json::Value::Null) => Ok(String::new()),
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(Error::Validation(format!("invalid quality: {}", other))),
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Response body for POST /api/prepare
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PrepareResponse {
    /// Identifier to poll with
    pub task_id: String,
}

/// Response body for GET /api/progress/:task_id
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    /// Lifecycle status
    pub status: TaskStatus,
    /// Whole percent, 100 only once ready
    pub percent: u8,
    /// Transfer speed as reported by the engine
    pub speed: String,
    /// Estimated time remaining as reported by the engine
    pub eta: String,
    /// Human-readable status line
    pub message: String,
    /// Output file name, once ready
    pub filename: Option<String>,
    /// Output size in bytes, once ready
    pub filesize: Option<u64>,
    /// Media title
    pub title: String,
    /// Channel or uploader
    pub channel: String,
}

impl From<Task> for ProgressResponse {
    fn from(task: Task) -> Self {
        Self {
            status: task.status,
            percent: task.percent,
            speed: task.speed,
            eta: task.eta,
            message: task.message,
            filename: task.filename,
            filesize: task.filesize,
            title: task.title,
            channel: task.channel,
        }
    }
}

/// Response body for POST /api/cancel/:task_id
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CancelResponse {
    /// Cancelled task
    pub task_id: String,
    /// Status after the call (always "cancelled")
    pub status: TaskStatus,
}

/// Response body for GET /health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Current server time (RFC 3339)
    pub timestamp: String,
    /// Crate version
    pub version: String,
}

/// Turn a JSON extractor rejection into a validation error
pub(crate) fn json_rejection(rejection: JsonRejection) -> Error {
    Error::Validation(format!("invalid request body: {}", rejection.body_text()))
}
