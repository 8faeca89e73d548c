//! Credential provisioning for the fetch engine.
//!
//! The engine may rewrite its cookie file while it runs, so the source of
//! truth (a mounted secret file, or an environment variable blob) is never
//! handed to it directly. Every probe and every download attempt gets its own
//! copy inside the task's working directory.

use std::path::{Path, PathBuf};

use crate::config::CredentialConfig;

const ARTIFACT_PREFIX: &str = "cookies_";
const ARTIFACT_SUFFIX: &str = ".txt";

/// Source of the credential blob
#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    secret_file: Option<PathBuf>,
    env_var: Option<String>,
}

impl CredentialStore {
    /// Store reading from the configured secret file and environment variable
    pub fn from_config(config: &CredentialConfig) -> Self {
        Self {
            secret_file: config.secret_file.clone(),
            env_var: config.env_var.clone(),
        }
    }

    /// Store that never provides credentials
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Write a fresh, uniquely named copy of the credential blob into `dir`.
    ///
    /// Returns `None` when no source is configured or readable; the engine
    /// then runs without credentials. Failures are logged, not propagated.
    pub async fn materialize(&self, dir: &Path) -> Option<PathBuf> {
        let blob = self.read_blob().await?;
        let target = dir.join(format!(
            "{ARTIFACT_PREFIX}{:08x}{ARTIFACT_SUFFIX}",
            rand::random::<u32>()
        ));

        match tokio::fs::write(&target, blob).await {
            Ok(()) => {
                tracing::debug!(path = %target.display(), "materialized credential copy");
                Some(target)
            }
            Err(e) => {
                tracing::warn!(
                    path = %target.display(),
                    error = %e,
                    "failed to write credential copy, continuing without credentials"
                );
                None
            }
        }
    }

    async fn read_blob(&self) -> Option<Vec<u8>> {
        if let Some(path) = &self.secret_file {
            match tokio::fs::read(path).await {
                Ok(bytes) => return Some(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read credential file");
                }
            }
        }

        let name = self.env_var.as_deref()?;
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Some(value.into_bytes()),
            _ => None,
        }
    }
}

/// Whether a file name was produced by [`CredentialStore::materialize`]
pub fn is_credential_artifact(file_name: &str) -> bool {
    file_name
        .strip_prefix(ARTIFACT_PREFIX)
        .and_then(|rest| rest.strip_suffix(ARTIFACT_SUFFIX))
        .is_some_and(|hex| hex.len() == 8 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}
