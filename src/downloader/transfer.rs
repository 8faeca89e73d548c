//! Opening finished artifacts for streaming to the client.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{TaskId, TaskStatus};

use super::MediaDownloader;

/// An open artifact ready to be streamed
#[derive(Debug)]
pub struct Artifact {
    /// Open file handle
    pub file: tokio::fs::File,
    /// Name offered to the client
    pub filename: String,
    /// Size at open time, used as Content-Length
    pub size: u64,
    /// Location on disk
    pub path: PathBuf,
}

impl Artifact {
    /// MIME type derived from the file name
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.filename)
    }
}

/// MIME type for a file name, by extension
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("m4a") => "audio/mp4",
        Some("opus") => "audio/opus",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

impl MediaDownloader {
    /// Open the artifact of a ready task
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for unknown ids
    /// - [`Error::NotReady`] unless the task is `ready`
    /// - [`Error::FileMissing`] if the file is gone from disk
    pub async fn open_artifact(&self, id: &TaskId) -> Result<Artifact> {
        let task = self
            .registry
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if task.status != TaskStatus::Ready {
            return Err(Error::NotReady {
                id: id.to_string(),
                status: task.status.to_string(),
            });
        }

        let path = task.filepath.ok_or_else(|| Error::FileMissing {
            id: id.to_string(),
            path: PathBuf::new(),
        })?;
        let missing = || Error::FileMissing {
            id: id.to_string(),
            path: path.clone(),
        };

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
            Err(e) => return Err(Error::Io(e)),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(missing());
        }

        let filename = task
            .filename
            .or_else(|| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "download".to_string());

        Ok(Artifact {
            file,
            filename,
            size: metadata.len(),
            path,
        })
    }
}
