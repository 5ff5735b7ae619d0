//! Core types for tracker-dl

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One tracked feed entry, keyed by title.
///
/// Items are born when the feed yields an entry, live through classification
/// and fetch in memory, and are persisted by [`ItemStore::commit`]. A
/// persisted item only ever changes again when a later commit flips its
/// `torrent_url` from `None` to a URL.
///
/// [`ItemStore::commit`]: crate::store::ItemStore::commit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerItem {
    /// Publication instant, timezone-naive (normalized to UTC on parse)
    pub timestamp: NaiveDateTime,

    /// Human-readable identifier; the dedup key within the store
    pub title: String,

    /// Canonical item page URL on the tracker site
    pub page_url: String,

    /// Torrent URL once successfully fetched; `None` marks a pending item
    pub torrent_url: Option<String>,
}

/// Result of one torrent fetch attempt.
///
/// Only `Saved` resolves the item; the other two leave it pending for the
/// next run. `NotReady` and `Failed` are deliberately distinct signals: the
/// tracker serves the item page (HTML) until the torrent artifact is
/// generated, so a content-type mismatch means "try again soon" while a
/// non-200 status means something is actually wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Status 200 with the expected torrent content type; payload written
    Saved {
        /// Where the torrent file was written
        path: PathBuf,
    },

    /// Status 200 but the response is not yet the torrent artifact
    NotReady {
        /// Declared content type of the response
        content_type: String,
        /// Response body length, for the operator log
        body_len: usize,
    },

    /// Non-200 response
    Failed {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase, when the status has one
        reason: String,
    },
}

/// Per-run counters reported to the operator after a pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Items whose torrent was fetched and recorded this run
    pub resolved: usize,

    /// Whitelisted items that stayed pending (fetch not ready or failed)
    pub still_pending: usize,

    /// Items excluded by the blacklist this run
    pub blacklisted: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} resolved, {} still pending, {} blacklisted",
            self.resolved, self.still_pending, self.blacklisted
        )
    }
}
