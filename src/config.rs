//! Configuration types for tracker-dl
//!
//! All components receive an explicit [`Config`] (or the relevant sub-config)
//! at construction time; nothing reads process-global state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for a tracker run
///
/// The four path/source fields mirror the CLI surface:
/// `<store_path> <feed_source> <output_dir> [<blacklist_path>]`.
/// Tracker-site specifics live in the nested [`TrackerConfig`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path of the tab-separated item store (must already exist)
    pub store_path: PathBuf,

    /// Feed source: an HTTP(S) URL or a local file path
    pub feed_source: String,

    /// Directory where fetched torrent files are written
    pub output_dir: PathBuf,

    /// Optional blacklist specification file; absent means nothing is filtered
    #[serde(default)]
    pub blacklist_path: Option<PathBuf>,

    /// Tracker site settings (login, URL segments, content type)
    #[serde(default)]
    pub tracker: TrackerConfig,
}

/// Tracker site configuration
///
/// Defaults target the site layout this tool was written for; every field is
/// overridable for trackers with a different URL scheme.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Login form endpoint
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Account username (no login is attempted when absent)
    #[serde(default)]
    pub username: Option<String>,

    /// Account password
    #[serde(default)]
    pub password: Option<String>,

    /// URL path segment marking an item page
    #[serde(default = "default_page_segment")]
    pub page_segment: String,

    /// URL path segment marking the item's torrent resource
    #[serde(default = "default_download_segment")]
    pub download_segment: String,

    /// Content type the tracker serves for a ready torrent artifact
    #[serde(default = "default_torrent_content_type")]
    pub torrent_content_type: String,

    /// HTTP timeout in seconds for feed, login, and torrent requests
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// User-Agent header sent on all requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            username: None,
            password: None,
            page_segment: default_page_segment(),
            download_segment: default_download_segment(),
            torrent_content_type: default_torrent_content_type(),
            http_timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_login_url() -> String {
    "http://en.metal-tracker.com/user/login.html".to_string()
}

fn default_page_segment() -> String {
    "/torrents/".to_string()
}

fn default_download_segment() -> String {
    "/torrents/download/id/".to_string()
}

fn default_torrent_content_type() -> String {
    "application/x-bittorrent".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("tracker-dl/", env!("CARGO_PKG_VERSION")).to_string()
}
