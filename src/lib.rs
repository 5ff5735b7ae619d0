//! # tracker-dl
//!
//! Incremental RSS tracker feed monitor with durable retry of torrent
//! downloads.
//!
//! Each run diffs the freshly parsed feed against a tab-separated store of
//! known items, filters candidates through a case-insensitive blacklist
//! pattern, fetches the torrent file for every surviving item through an
//! authenticated tracker session, and commits the results back to the store
//! with a backup-before-write discipline. Items whose torrent is not yet
//! available stay pending in the store and are retried by the next run —
//! re-running after a partial failure is always safe.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tracker_dl::{auth, Config, Tracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         store_path: "tracker.tsv".into(),
//!         feed_source: "http://en.metal-tracker.com/rss/feed.xml".to_string(),
//!         output_dir: "./torrents".into(),
//!         ..Config::default()
//!     };
//!
//!     let client = auth::login(&config.tracker).await?;
//!     let summary = Tracker::new(config, client).await?.run().await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Tracker session login
pub mod auth;
/// Content blacklist compiled from a pattern specification
pub mod blacklist;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Feed fetching and parsing
pub mod feed;
/// Torrent URL derivation and acquisition
pub mod fetcher;
/// The per-run reconciliation pipeline
pub mod pipeline;
/// Durable tab-separated item store
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, TrackerConfig};
pub use error::{Error, Result};
pub use pipeline::Tracker;
pub use store::ItemStore;
pub use types::{FetchOutcome, RunSummary, TrackerItem};
