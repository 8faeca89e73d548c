//! Metadata lookup handler.

use super::{InfoRequest, json_rejection};
use crate::api::AppState;
use crate::downloader::MediaSummary;
use crate::error::Error;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

/// POST /api/info - Media metadata and quality choices
#[utoipa::path(
    post,
    path = "/api/info",
    tag = "info",
    request_body = InfoRequest,
    responses(
        (status = 200, description = "Media summary", body = MediaSummary),
        (status = 400, description = "Invalid URL or metadata lookup failed", body = crate::error::ApiError),
        (status = 503, description = "Fetch engine not installed", body = crate::error::ApiError)
    )
)]
pub async fn media_info(
    State(state): State<AppState>,
    body: Result<Json<InfoRequest>, JsonRejection>,
) -> Result<Json<MediaSummary>, Error> {
    let Json(request) = body.map_err(json_rejection)?;
    let summary = state.downloader.info(&request.url).await?;
    Ok(Json(summary))
}
