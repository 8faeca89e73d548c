//! Media fetch engines
//!
//! This module provides a trait-based boundary between the download
//! orchestrator and the tool that actually talks to the media site. The
//! orchestrator only ever sees [`FetchEngine`]; it never builds command lines
//! or parses tool output itself.
//!
//! ## Architecture
//!
//! - [`YtDlpEngine`]: drives an external `yt-dlp` binary
//! - [`UnavailableEngine`]: stand-in used when no binary can be found, so the
//!   server still starts and reports a clear error per request
//!
//! Format choices are expressed as engine-independent [`FormatCandidate`]s;
//! each engine renders them into its own selector syntax.

mod format;
mod traits;
mod unavailable;
mod ytdlp;

pub use format::{AudioTranscode, FormatCandidate, StreamMode, candidates_for};
pub use traits::{FetchEngine, FetchRequest, ProgressCallback};
pub use unavailable::UnavailableEngine;
pub use ytdlp::{YtDlpEngine, parse_progress_line};
