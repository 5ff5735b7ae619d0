//! Durable item store backed by a tab-separated file.
//!
//! The store is the single shared mutable resource of a run. It is protected
//! by copy-before-write rather than locking: every commit first copies the
//! current file to a timestamped backup in the same directory, then
//! overwrites the primary with the merged table. Concurrent runs against the
//! same store file must be serialized by the operator.
//!
//! File format: four tab-separated columns (`timestamp`, `title`,
//! `page_url`, `torrent_url`), no header row, UTF-8, one row per item. An
//! empty fourth column marks a pending item.

use crate::error::{Error, Result};
use crate::types::TrackerItem;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Timestamp format written to store rows
const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Older rows used a space separator; still accepted on load
const ROW_TIMESTAMP_FORMAT_LEGACY: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp prefix of backup filenames
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// The durable set of known items.
///
/// Holds the parsed table in memory between [`load`](ItemStore::load) and
/// [`commit`](ItemStore::commit); commits replace the in-memory table with
/// the merged rows, so repeated commits in one process observe their own
/// writes.
pub struct ItemStore {
    path: PathBuf,
    items: Vec<TrackerItem>,
}

impl ItemStore {
    /// Load the store from `path`.
    ///
    /// A missing file is a fatal configuration error, not an empty store:
    /// the operator creates the (possibly empty) file once, and a vanished
    /// file on a later run means the invocation is pointed somewhere wrong.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file does not exist,
    /// [`Error::StoreCorrupt`] if any row fails to parse into exactly four
    /// columns with a valid timestamp, or [`Error::Io`] on read failure.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Err(Error::Config {
                message: format!("store file '{}' does not exist", path.display()),
                key: Some("store_path".to_string()),
            });
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let items = parse_table(&content, &path)?;

        debug!(
            path = %path.display(),
            rows = items.len(),
            pending = items.iter().filter(|i| i.torrent_url.is_none()).count(),
            "loaded item store"
        );

        Ok(Self { path, items })
    }

    /// All rows currently held, in store order (most recent commit leftmost).
    pub fn items(&self) -> &[TrackerItem] {
        &self.items
    }

    /// Compute the candidate set for one run: `incoming` items whose title
    /// the store has never seen, followed by the store's own unresolved
    /// rows. Relative order within each source is preserved.
    ///
    /// Every returned item has `torrent_url` forced to `None` — at this
    /// stage the field is a pending marker, not an informative value; it is
    /// filled back in only by a successful fetch.
    pub fn pending_items(&self, incoming: &[TrackerItem]) -> Vec<TrackerItem> {
        let known: HashSet<&str> = self.items.iter().map(|i| i.title.as_str()).collect();

        let mut candidates: Vec<TrackerItem> = incoming
            .iter()
            .filter(|item| !known.contains(item.title.as_str()))
            .cloned()
            .collect();
        candidates.extend(
            self.items
                .iter()
                .filter(|item| item.torrent_url.is_none())
                .cloned(),
        );

        for item in &mut candidates {
            item.torrent_url = None;
        }

        candidates
    }

    /// Merge `resolved` into the store and persist.
    ///
    /// The current file is first copied to
    /// `YYYY-MM-DD-HH-MM-SS_<original-filename>` next to it; if that copy
    /// fails the commit aborts with [`Error::BackupWrite`] and the primary
    /// file is untouched. The merged table places `resolved` before the
    /// existing rows and drops duplicate titles keeping the first
    /// occurrence, so incoming values win ties.
    ///
    /// First-occurrence-wins can in principle let a pending incoming row
    /// shadow a previously resolved row of the same title. The pipeline's
    /// diff never produces that input, but the hazard is surfaced with a
    /// warning here rather than silently corrected.
    pub async fn commit(&mut self, resolved: Vec<TrackerItem>) -> Result<()> {
        let backup_path = self.backup_path(chrono::Local::now().naive_local());
        tokio::fs::copy(&self.path, &backup_path)
            .await
            .map_err(|e| Error::BackupWrite {
                path: backup_path.clone(),
                reason: e.to_string(),
            })?;
        debug!(backup = %backup_path.display(), "store backed up");

        let resolved_titles: HashSet<&str> = self
            .items
            .iter()
            .filter(|i| i.torrent_url.is_some())
            .map(|i| i.title.as_str())
            .collect();
        for item in resolved.iter().filter(|i| i.torrent_url.is_none()) {
            if resolved_titles.contains(item.title.as_str()) {
                warn!(
                    title = %item.title,
                    "pending row shadows a previously resolved item; its torrent URL is lost"
                );
            }
        }

        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(resolved.len() + self.items.len());
        for item in resolved.into_iter().chain(self.items.drain(..)) {
            if seen.insert(item.title.clone()) {
                merged.push(item);
            }
        }

        tokio::fs::write(&self.path, format_table(&merged)).await?;

        info!(
            path = %self.path.display(),
            rows = merged.len(),
            "store committed"
        );
        self.items = merged;
        Ok(())
    }

    fn backup_path(&self, now: NaiveDateTime) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup_name = format!("{}_{}", now.format(BACKUP_TIMESTAMP_FORMAT), file_name);
        match self.path.parent() {
            Some(dir) => dir.join(backup_name),
            None => PathBuf::from(backup_name),
        }
    }
}

/// Parse the whole table, reporting the first bad row with its line number.
fn parse_table(content: &str, path: &Path) -> Result<Vec<TrackerItem>> {
    let mut items = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let item = parse_row(line).map_err(|reason| Error::StoreCorrupt {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        })?;
        items.push(item);
    }
    Ok(items)
}

fn parse_row(line: &str) -> std::result::Result<TrackerItem, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 4 {
        return Err(format!(
            "expected 4 tab-separated fields, got {}",
            fields.len()
        ));
    }

    let timestamp = parse_row_timestamp(fields[0])
        .map_err(|e| format!("bad timestamp '{}': {}", fields[0], e))?;

    if fields[1].is_empty() {
        return Err("empty title".to_string());
    }

    Ok(TrackerItem {
        timestamp,
        title: fields[1].to_string(),
        page_url: fields[2].to_string(),
        torrent_url: if fields[3].is_empty() {
            None
        } else {
            Some(fields[3].to_string())
        },
    })
}

fn parse_row_timestamp(text: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, ROW_TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, ROW_TIMESTAMP_FORMAT_LEGACY))
}

fn format_table(items: &[TrackerItem]) -> String {
    let mut table = String::new();
    for item in items {
        table.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            item.timestamp.format(ROW_TIMESTAMP_FORMAT),
            item.title,
            item.page_url,
            item.torrent_url.as_deref().unwrap_or(""),
        ));
    }
    table
}
