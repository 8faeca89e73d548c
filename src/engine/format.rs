//! Format candidates and fallback chains

use crate::types::FormatKind;

/// How streams are selected for a candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamMode {
    /// Best video stream plus best audio stream, merged afterwards
    SeparateStreams,
    /// A single pre-muxed stream
    Combined,
    /// Best audio stream (falling back to best overall)
    AudioOnly,
}

/// Structured format selection criteria for one attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatCandidate {
    /// Upper bound on video height; `None` means unconstrained
    pub max_height: Option<u32>,
    /// Stream selection mode
    pub mode: StreamMode,
}

impl FormatCandidate {
    /// Whether the engine has to merge two streams for this candidate
    pub fn needs_merge(&self) -> bool {
        self.mode == StreamMode::SeparateStreams
    }
}

impl std::fmt::Display for FormatCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.mode {
            StreamMode::SeparateStreams => "separate",
            StreamMode::Combined => "combined",
            StreamMode::AudioOnly => "audio",
        };
        match self.max_height {
            Some(h) => write!(f, "{mode}<={h}p"),
            None => f.write_str(mode),
        }
    }
}

/// Audio extraction directive applied after an audio-only download
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioTranscode {
    /// Target codec (e.g. "mp3")
    pub codec: String,
    /// Target bitrate in kbit/s (e.g. "192")
    pub bitrate: String,
}

/// Ordered candidates for a request, most preferred first.
///
/// Video requests degrade from separate streams at the requested height to
/// a single combined stream of any height; audio requests have one candidate.
pub fn candidates_for(kind: FormatKind, max_height: u32) -> Vec<FormatCandidate> {
    match kind {
        FormatKind::Audio => vec![FormatCandidate {
            max_height: None,
            mode: StreamMode::AudioOnly,
        }],
        FormatKind::Video => vec![
            FormatCandidate {
                max_height: Some(max_height),
                mode: StreamMode::SeparateStreams,
            },
            FormatCandidate {
                max_height: None,
                mode: StreamMode::SeparateStreams,
            },
            FormatCandidate {
                max_height: Some(max_height),
                mode: StreamMode::Combined,
            },
            FormatCandidate {
                max_height: None,
                mode: StreamMode::Combined,
            },
        ],
    }
}
