//! Torrent acquisition: URL derivation, a single GET, and payload triage.
//!
//! The tracker serves the item page (HTML) at the download URL until the
//! torrent artifact has been generated, so a fetch has three outcomes rather
//! than two: saved, not ready yet, or failed. Nothing here retries — a
//! pending item is simply rediscovered by the next run's diff.

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::types::FetchOutcome;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension given to saved torrent payloads
const TORRENT_EXTENSION: &str = "torrent";

/// Fetches torrent files for whitelisted items through a pre-authenticated
/// HTTP client (see [`crate::auth::login`]).
pub struct TorrentFetcher {
    client: reqwest::Client,
    config: TrackerConfig,
    output_dir: PathBuf,
}

impl TorrentFetcher {
    /// Create a fetcher writing into `output_dir`.
    ///
    /// The client carries the tracker session; construct it with
    /// [`crate::auth::login`] before building the fetcher.
    pub fn new(
        client: reqwest::Client,
        config: TrackerConfig,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            config,
            output_dir: output_dir.into(),
        }
    }

    /// Derive the torrent download URL from an item page URL.
    ///
    /// Purely textual: the configured page segment is replaced with the
    /// download segment (`/torrents/178698.html` becomes
    /// `/torrents/download/id/178698.html`). No network involved.
    pub fn torrent_url(&self, page_url: &str) -> String {
        page_url.replace(&self.config.page_segment, &self.config.download_segment)
    }

    /// Issue a single GET for `torrent_url` and triage the response.
    ///
    /// A 200 with the expected torrent content type writes the body to
    /// `<output_dir>/<sanitized title>.torrent` (overwriting) and returns
    /// [`FetchOutcome::Saved`]. A 200 with any other content type returns
    /// [`FetchOutcome::NotReady`]; any other status returns
    /// [`FetchOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Transport failures and file-write failures propagate as errors; the
    /// pipeline contains them per item.
    pub async fn fetch(&self, torrent_url: &str, title: &str) -> Result<FetchOutcome> {
        info!(title = %title, url = %torrent_url, "fetching torrent");

        let response = self.client.get(torrent_url).send().await?;
        let status = response.status();
        if status.as_u16() != 200 {
            warn!(title = %title, status = status.as_u16(), "torrent fetch failed");
            return Ok(FetchOutcome::Failed {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.bytes().await?;

        if !media_type_matches(&content_type, &self.config.torrent_content_type) {
            debug!(
                title = %title,
                content_type = %content_type,
                body_len = body.len(),
                "torrent not ready yet"
            );
            return Ok(FetchOutcome::NotReady {
                content_type,
                body_len: body.len(),
            });
        }

        let path = self
            .output_dir
            .join(format!("{}.{}", sanitized_file_stem(title), TORRENT_EXTENSION));
        tokio::fs::write(&path, &body).await?;
        info!(title = %title, path = %path.display(), "torrent saved");

        Ok(FetchOutcome::Saved { path })
    }

    /// Directory torrent files are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Strip path separators from a title so it is safe as a filename stem.
pub fn sanitized_file_stem(title: &str) -> String {
    title.chars().filter(|c| *c != '/' && *c != '\\').collect()
}

/// Compare the media type of a `Content-Type` header value (parameters such
/// as `charset` ignored) against the expected type, case-insensitively.
fn media_type_matches(header_value: &str, expected: &str) -> bool {
    let media_type = header_value.split(';').next().unwrap_or("").trim();
    media_type.eq_ignore_ascii_case(expected)
}
