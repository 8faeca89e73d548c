//! Metadata lookup for the info endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use utoipa::ToSchema;

use crate::error::{EngineError, Error, Result};
use crate::types::{MediaInfo, QualityOption};

use super::MediaDownloader;
use super::validation::validate_url;

/// Smallest height offered as a quality choice
const MIN_OFFERED_HEIGHT: u32 = 360;

/// Offered when the probe lists no usable heights
const FALLBACK_HEIGHTS: [u32; 3] = [1080, 720, 480];

/// Summary of a media item shown before the user starts a download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MediaSummary {
    /// Media title ("unknown" when missing)
    pub title: String,
    /// Channel or uploader ("unknown" when missing)
    pub channel: String,
    /// Duration in whole seconds
    pub duration: u64,
    /// Thumbnail URL (empty when missing)
    pub thumbnail: String,
    /// View count (0 when missing)
    pub view_count: u64,
    /// Selectable heights, highest first
    pub qualities: Vec<QualityOption>,
    /// Whether the duration exceeds the advisory maximum
    pub too_long: bool,
}

impl MediaSummary {
    /// Build the summary from probe output
    pub fn from_info(info: &MediaInfo, max_duration: Duration) -> Self {
        let duration = info.duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);

        let heights: BTreeSet<u32> = info
            .formats
            .iter()
            .filter_map(|f| f.height)
            .filter(|h| *h >= MIN_OFFERED_HEIGHT)
            .collect();
        let qualities = if heights.is_empty() {
            FALLBACK_HEIGHTS
                .iter()
                .copied()
                .map(QualityOption::from_height)
                .collect()
        } else {
            heights.into_iter().rev().map(QualityOption::from_height).collect()
        };

        Self {
            title: info.title.clone().unwrap_or_else(|| "unknown".to_string()),
            channel: info
                .channel_or_uploader()
                .unwrap_or("unknown")
                .to_string(),
            duration: duration as u64,
            thumbnail: info.thumbnail.clone().unwrap_or_default(),
            view_count: info.view_count.unwrap_or(0),
            qualities,
            too_long: duration > max_duration.as_secs_f64(),
        }
    }
}

impl MediaDownloader {
    /// Probe a URL without downloading
    ///
    /// The probe gets its own scratch directory for the credential copy,
    /// which is removed again whatever the outcome.
    pub async fn info(&self, url: &str) -> Result<MediaSummary> {
        let url = validate_url(url, &self.config.download.allowed_hosts)?;

        let scratch = self
            .config
            .download
            .temp_dir
            .join(format!("info_{:08x}", rand::random::<u32>()));
        tokio::fs::create_dir_all(&scratch).await?;

        let credentials = self.credentials.materialize(&scratch).await;
        let result = self.engine.probe(&url, credentials.as_deref()).await;

        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            tracing::warn!(path = %scratch.display(), error = %e, "failed to remove probe scratch directory");
        }

        let info = result.map_err(|e| match e {
            EngineError::NotAvailable(_) => Error::Engine(e),
            other => {
                tracing::info!(url = %url, error = %other, "metadata probe failed");
                Error::Probe(other)
            }
        })?;

        Ok(MediaSummary::from_info(
            &info,
            self.config.download.max_duration,
        ))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormatInfo;

    fn format(height: Option<u32>) -> FormatInfo {
        FormatInfo { height }
    }

    #[test]
    fn qualities_are_distinct_descending_and_at_least_360() {
        let info = MediaInfo {
            formats: vec![
                format(Some(144)),
                format(Some(720)),
                format(None),
                format(Some(1080)),
                format(Some(720)),
                format(Some(360)),
            ],
            ..Default::default()
        };
        let summary = MediaSummary::from_info(&info, Duration::from_secs(7200));
        let values: Vec<&str> = summary.qualities.iter().map(|q| q.value.as_str()).collect();
        assert_eq!(values, vec!["1080", "720", "360"]);
        assert_eq!(summary.qualities[0].label, "1080p");
    }

    #[test]
    fn falls_back_to_standard_heights_and_placeholders() {
        let summary = MediaSummary::from_info(&MediaInfo::default(), Duration::from_secs(7200));
        let values: Vec<&str> = summary.qualities.iter().map(|q| q.value.as_str()).collect();
        assert_eq!(values, vec!["1080", "720", "480"]);
        assert_eq!(summary.title, "unknown");
        assert_eq!(summary.channel, "unknown");
        assert_eq!(summary.duration, 0);
        assert_eq!(summary.view_count, 0);
        assert!(!summary.too_long);
    }

    #[test]
    fn too_long_is_strictly_above_the_limit() {
        let limit = Duration::from_secs(7200);
        let at_limit = MediaInfo {
            duration: Some(7200.0),
            ..Default::default()
        };
        assert!(!MediaSummary::from_info(&at_limit, limit).too_long);

        let over = MediaInfo {
            duration: Some(7200.5),
            ..Default::default()
        };
        let summary = MediaSummary::from_info(&over, limit);
        assert!(summary.too_long);
        assert_eq!(summary.duration, 7200);
    }
}
