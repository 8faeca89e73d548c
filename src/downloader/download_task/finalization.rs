//! Partial file purge and output selection.

use std::path::{Path, PathBuf};

use crate::credentials::is_credential_artifact;

/// The artifact chosen after a successful attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutputFile {
    pub(crate) path: PathBuf,
    pub(crate) name: String,
    pub(crate) size: u64,
}

/// Delete every regular file left by a failed attempt, except credential copies.
///
/// Returns the number of files removed. Errors are logged and skipped.
pub(crate) async fn purge_partial_files(dir: &Path) -> usize {
    let mut removed = 0;
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "failed to list task directory");
            return 0;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if name.to_str().is_some_and(is_credential_artifact) {
            continue;
        }
        match entry.file_type().await {
            Ok(ft) if ft.is_file() => {}
            _ => continue,
        }

        let path = entry.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to delete partial file")
            }
        }
    }

    removed
}

/// Pick the largest regular file in `dir`, ignoring credential copies and
/// hidden files.
pub(crate) async fn locate_output(dir: &Path) -> std::io::Result<Option<OutputFile>> {
    let mut best: Option<OutputFile> = None;
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') || is_credential_artifact(&name) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }

        let size = metadata.len();
        if best.as_ref().is_none_or(|b| size > b.size) {
            best = Some(OutputFile {
                path: entry.path(),
                name,
                size,
            });
        }
    }

    Ok(best)
}
