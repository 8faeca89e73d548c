//! Download task execution -- format fallback and artifact selection.
//!
//! Split into focused submodules:
//! - [`context`] - Shared state handed to a spawned download
//! - [`orchestration`] - Top-level lifecycle and the fallback loop
//! - [`progress`] - Engine progress events applied to the registry
//! - [`finalization`] - Partial file purge and output selection

mod context;
mod finalization;
mod orchestration;
mod progress;


pub(crate) use context::DownloadTaskContext;
pub(crate) use orchestration::run_download_task;
