//! Download task orchestration - top-level lifecycle for a single download.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::engine::{AudioTranscode, FetchRequest, candidates_for};
use crate::error::{EngineError, Error, Result};
use crate::types::{FormatKind, TaskStatus, TaskUpdate};

use super::context::DownloadTaskContext;
use super::finalization::{locate_output, purge_partial_files};
use super::progress::ProgressHook;

/// Core download task -- orchestrates the full lifecycle of a single download.
///
/// Phases:
/// 1. Create the working directory and probe metadata
/// 2. Try each format candidate in order until one succeeds
/// 3. Select the artifact and mark the task ready
///
/// Every error and panic ends here as task status `error`; nothing escapes
/// the spawned task. If the task was cancelled or removed meanwhile, its
/// working directory is deleted instead.
pub(crate) async fn run_download_task(ctx: DownloadTaskContext) {
    let outcome = AssertUnwindSafe(execute(&ctx)).catch_unwind().await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(task_id = %ctx.id, error = %e, "download failed");
            ctx.mark_failed(&e.to_string());
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            tracing::error!(task_id = %ctx.id, reason = %reason, "download task panicked");
            ctx.mark_failed(&format!("internal error: {reason}"));
        }
    }

    if ctx.is_abandoned() {
        discard_working_dir(&ctx).await;
    }
}

async fn execute(ctx: &DownloadTaskContext) -> Result<()> {
    let id = &ctx.id;

    // Phase 1: Working directory and metadata
    tokio::fs::create_dir_all(&ctx.task_dir).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create task directory: {}", e),
        ))
    })?;

    if ctx.is_abandoned() {
        tracing::info!(task_id = %id, "task cancelled before start");
        return Ok(());
    }

    let probe_credentials = ctx.credentials.materialize(&ctx.task_dir).await;
    let info = ctx
        .engine
        .probe(&ctx.url, probe_credentials.as_deref())
        .await?;
    ctx.registry.update(
        id,
        TaskUpdate {
            title: info.title.clone(),
            channel: info.channel_or_uploader().map(str::to_string),
            ..Default::default()
        },
    );

    // Phase 2: Format fallback
    let candidates = candidates_for(ctx.kind, ctx.quality);
    let transcode = (ctx.kind == FormatKind::Audio).then(|| AudioTranscode {
        codec: ctx.config.engine.audio_codec.clone(),
        bitrate: ctx.config.engine.audio_bitrate.clone(),
    });
    let total = candidates.len();
    let mut last_error: Option<EngineError> = None;

    for (index, candidate) in candidates.into_iter().enumerate() {
        if ctx.is_abandoned() {
            tracing::info!(task_id = %id, "task cancelled, skipping remaining attempts");
            return Ok(());
        }

        let attempt = index + 1;
        tracing::info!(
            task_id = %id,
            attempt,
            total,
            candidate = %candidate,
            engine = ctx.engine.name(),
            "starting download attempt"
        );
        ctx.set_message(format!("downloading (attempt {attempt}/{total})"));

        let request = FetchRequest {
            url: ctx.url.clone(),
            candidate,
            output_dir: ctx.task_dir.clone(),
            credentials: ctx.credentials.materialize(&ctx.task_dir).await,
            transcode: transcode.clone(),
        };
        let hook = ProgressHook::new(ctx.registry.clone(), id.clone());

        match ctx.engine.fetch(&request, hook.into_callback()).await {
            Ok(()) => {
                tracing::info!(task_id = %id, attempt, candidate = %candidate, "download attempt succeeded");
                last_error = None;
                break;
            }
            Err(e) if e.is_auth() => {
                tracing::error!(task_id = %id, attempt, error = %e, "authentication failure, not trying other formats");
                last_error = Some(e);
                break;
            }
            Err(e) => {
                tracing::warn!(task_id = %id, attempt, candidate = %candidate, error = %e, "download attempt failed");
                let purged = purge_partial_files(&ctx.task_dir).await;
                tracing::debug!(task_id = %id, purged, "removed partial files");
                last_error = Some(e);
            }
        }
    }

    if let Some(e) = last_error {
        return Err(e.into());
    }

    // Phase 3: Artifact selection
    if ctx.is_abandoned() {
        tracing::info!(task_id = %id, "task cancelled during download");
        return Ok(());
    }

    let output = locate_output(&ctx.task_dir).await?.ok_or(Error::NoOutput)?;
    let applied = ctx.registry.update(
        id,
        TaskUpdate {
            status: Some(TaskStatus::Ready),
            percent: Some(100),
            speed: Some(String::new()),
            eta: Some(String::new()),
            message: Some("ready".to_string()),
            filepath: Some(output.path.clone()),
            filename: Some(output.name.clone()),
            filesize: Some(output.size),
            ..Default::default()
        },
    );

    if applied {
        tracing::info!(
            task_id = %id,
            filename = %output.name,
            size = output.size,
            "download ready"
        );
    }
    Ok(())
}

async fn discard_working_dir(ctx: &DownloadTaskContext) {
    match tokio::fs::remove_dir_all(&ctx.task_dir).await {
        Ok(()) => tracing::debug!(task_id = %ctx.id, "removed working directory of abandoned task"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(task_id = %ctx.id, error = %e, "failed to remove working directory")
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
