//! The reconciliation pipeline: one run from feed to committed store.
//!
//! Per run each candidate item moves through a small state machine:
//! pending → whitelisted or blacklisted, whitelisted → resolved or still
//! pending. Everything executes strictly sequentially — one fetch at a time,
//! in diff order — and a run either reaches its commit or aborts leaving the
//! store untouched. Per-item fetch problems never abort the run; the item
//! simply stays pending and is rediscovered next time.

use crate::blacklist::Blacklist;
use crate::config::Config;
use crate::error::Result;
use crate::feed::{self, FeedEntry};
use crate::fetcher::TorrentFetcher;
use crate::store::ItemStore;
use crate::types::{FetchOutcome, RunSummary, TrackerItem};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Orchestrates feed reading, store reconciliation, classification, and
/// torrent fetching over one shared HTTP session.
pub struct Tracker {
    config: Config,
    client: reqwest::Client,
    blacklist: Option<Blacklist>,
    fetcher: TorrentFetcher,
}

impl Tracker {
    /// Build a tracker from its configuration and a pre-authenticated HTTP
    /// client (see [`crate::auth::login`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] or [`Error::Io`] if a configured
    /// blacklist file cannot be read or compiled — classification failures
    /// belong at startup, not in the middle of a run.
    ///
    /// [`Error::InvalidPattern`]: crate::error::Error::InvalidPattern
    /// [`Error::Io`]: crate::error::Error::Io
    pub async fn new(config: Config, client: reqwest::Client) -> Result<Self> {
        let blacklist = match &config.blacklist_path {
            Some(path) => Some(Blacklist::from_file(path).await?),
            None => None,
        };
        let fetcher = TorrentFetcher::new(
            client.clone(),
            config.tracker.clone(),
            &config.output_dir,
        );

        Ok(Self {
            config,
            client,
            blacklist,
            fetcher,
        })
    }

    /// Execute one full run and return the per-run counters.
    ///
    /// # Errors
    ///
    /// Fatal conditions abort the run: unreadable feed, missing or corrupt
    /// store, failed backup copy. Per-item fetch failures do not.
    pub async fn run(&self) -> Result<RunSummary> {
        let entries = feed::fetch_entries(&self.client, &self.config.feed_source).await?;
        let (incoming, descriptions) = collect_entries(entries);

        let mut store = ItemStore::load(&self.config.store_path).await?;
        let known_titles: HashSet<String> =
            store.items().iter().map(|i| i.title.clone()).collect();

        let candidates = store.pending_items(&incoming);
        if candidates.is_empty() {
            info!("no new or pending items");
            return Ok(RunSummary::default());
        }

        if let Some(blacklist) = &self.blacklist {
            info!(
                pattern = %blacklist.pattern(),
                candidates = candidates.len(),
                "filtering candidate items"
            );
        }
        let (whitelisted, blacklisted) = match &self.blacklist {
            Some(blacklist) => blacklist.split(candidates, &descriptions),
            None => (candidates, Vec::new()),
        };

        report_items("kept (whitelisted)", &whitelisted, &descriptions);
        report_items("filtered out (blacklisted)", &blacklisted, &descriptions);

        let mut summary = RunSummary {
            blacklisted: blacklisted.len(),
            ..RunSummary::default()
        };

        if whitelisted.is_empty() {
            info!("no whitelisted items, skipping commit");
            return Ok(summary);
        }

        info!(count = whitelisted.len(), "fetching torrents");
        let mut processed = Vec::with_capacity(whitelisted.len());
        for mut item in whitelisted {
            let torrent_url = self.fetcher.torrent_url(&item.page_url);
            match self.fetcher.fetch(&torrent_url, &item.title).await {
                Ok(FetchOutcome::Saved { .. }) => {
                    item.torrent_url = Some(torrent_url);
                    summary.resolved += 1;
                }
                Ok(FetchOutcome::NotReady { .. }) | Ok(FetchOutcome::Failed { .. }) => {
                    // Already logged with its specifics by the fetcher
                    summary.still_pending += 1;
                }
                Err(e) => {
                    warn!(title = %item.title, error = %e, "fetch errored, item stays pending");
                    summary.still_pending += 1;
                }
            }
            processed.push(item);
        }

        // Committing still-pending items matters only for titles the store
        // has never recorded; when nothing resolved and every pending title
        // is already stored, the merged table would be identical, so the
        // commit (and its backup) is skipped.
        let has_new_titles = processed
            .iter()
            .any(|item| !known_titles.contains(&item.title));
        if summary.resolved > 0 || has_new_titles {
            store.commit(processed).await?;
        } else {
            info!("nothing resolved and no unrecorded items, skipping commit");
        }

        info!(%summary, "run complete");
        Ok(summary)
    }
}

/// Turn feed entries into tracker items plus the transient by-title
/// description map used for classification and display. New items are born
/// pending; the torrent URL is only assigned by a successful fetch.
fn collect_entries(entries: Vec<FeedEntry>) -> (Vec<TrackerItem>, HashMap<String, String>) {
    let mut items = Vec::with_capacity(entries.len());
    let mut descriptions = HashMap::with_capacity(entries.len());

    for entry in entries {
        descriptions.insert(entry.title.clone(), entry.description);
        items.push(TrackerItem {
            timestamp: entry.timestamp,
            title: entry.title,
            page_url: entry.page_url,
            torrent_url: None,
        });
    }

    (items, descriptions)
}

/// Log one classified group: a preview line per item (title and style),
/// with page URL and full description behind the debug level.
fn report_items(label: &str, items: &[TrackerItem], descriptions: &HashMap<String, String>) {
    if items.is_empty() {
        return;
    }

    info!("the following entries were {} ({})", label, items.len());
    for item in items {
        let description = descriptions
            .get(&item.title)
            .map(String::as_str)
            .unwrap_or("");
        info!(
            title = %item.title,
            style = %feed::style_from_description(description),
            "  {}", item.title
        );
        debug!(page_url = %item.page_url, description = %description, "entry detail");
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
