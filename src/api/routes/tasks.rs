//! Task handlers: prepare, progress, cancel and file download.

use super::{
    CancelResponse, PrepareRequest, PrepareResponse, ProgressResponse, json_rejection,
};
use crate::api::AppState;
use crate::error::Error;
use crate::types::TaskId;
use axum::{
    Json,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

/// Read buffer size for streamed file responses
const TRANSFER_CHUNK_SIZE: usize = 64 * 1024;

/// Parse a task id path segment; anything not shaped like a generated id is unknown
fn parse_task_id(raw: String) -> Result<TaskId, Error> {
    if TaskId::is_well_formed(&raw) {
        Ok(TaskId::from(raw))
    } else {
        Err(Error::NotFound(raw))
    }
}

/// POST /api/prepare - Start a download
#[utoipa::path(
    post,
    path = "/api/prepare",
    tag = "tasks",
    request_body = PrepareRequest,
    responses(
        (status = 200, description = "Task admitted", body = PrepareResponse),
        (status = 400, description = "Invalid URL, format or quality", body = crate::error::ApiError),
        (status = 429, description = "Too many active downloads", body = crate::error::ApiError)
    )
)]
pub async fn prepare_download(
    State(state): State<AppState>,
    body: Result<Json<PrepareRequest>, JsonRejection>,
) -> Result<Json<PrepareResponse>, Error> {
    let Json(request) = body.map_err(json_rejection)?;
    let quality = request.quality_text()?;
    let format = request.format.as_deref().unwrap_or_default();

    let id = state.downloader.prepare(&request.url, format, &quality)?;

    Ok(Json(PrepareResponse {
        task_id: id.to_string(),
    }))
}

/// GET /api/progress/:task_id - Poll a task
#[utoipa::path(
    get,
    path = "/api/progress/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "Current task state", body = ProgressResponse),
        (status = 404, description = "Unknown task", body = crate::error::ApiError)
    )
)]
pub async fn get_progress(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ProgressResponse>, Error> {
    let task = state.downloader.progress(&parse_task_id(task_id)?)?;
    Ok(Json(task.into()))
}

/// POST /api/cancel/:task_id - Cancel an active task
#[utoipa::path(
    post,
    path = "/api/cancel/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "Task cancelled", body = CancelResponse),
        (status = 404, description = "Unknown task", body = crate::error::ApiError),
        (status = 409, description = "Task already finished", body = crate::error::ApiError)
    )
)]
pub async fn cancel_download(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<CancelResponse>, Error> {
    let id = parse_task_id(task_id)?;
    let status = state.downloader.cancel(&id)?;

    Ok(Json(CancelResponse {
        task_id: id.to_string(),
        status,
    }))
}

/// GET /api/download/:task_id - Stream the finished file
///
/// Serving a file schedules removal of the task after the post-transfer
/// delay.
#[utoipa::path(
    get,
    path = "/api/download/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "File contents as an attachment"),
        (status = 400, description = "Task not ready", body = crate::error::ApiError),
        (status = 404, description = "Unknown task or file expired", body = crate::error::ApiError)
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response, Error> {
    let id = parse_task_id(task_id)?;
    let artifact = state.downloader.open_artifact(&id).await?;

    tracing::info!(
        task_id = %id,
        filename = %artifact.filename,
        size = artifact.size,
        "serving file"
    );
    state.downloader.schedule_post_transfer_cleanup(id);

    let content_type = artifact.content_type();
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&artifact.filename)
    );
    let body = Body::from_stream(ReaderStream::with_capacity(
        artifact.file,
        TRANSFER_CHUNK_SIZE,
    ));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, artifact.size.to_string())
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|e| Error::Other(format!("failed to build file response: {}", e)))
}
