//! Error types for tracker-dl
//!
//! Fatal conditions (unreadable store, invalid blacklist pattern, failed
//! backup) abort a run before or without mutating the store. Per-item fetch
//! conditions are not errors at all — they are [`FetchOutcome`] values and
//! are handled by the pipeline without aborting.
//!
//! [`FetchOutcome`]: crate::types::FetchOutcome

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tracker-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tracker-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "store_path")
        key: Option<String>,
    },

    /// Store file exists but cannot be parsed into the expected four columns
    #[error("corrupt store {path} at line {line}: {reason}")]
    StoreCorrupt {
        /// Path of the store file that failed to parse
        path: PathBuf,
        /// 1-based line number of the first unparseable row
        line: usize,
        /// What was wrong with the row
        reason: String,
    },

    /// Blacklist specification failed to compile as a regular expression
    #[error("invalid blacklist pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern text that failed to compile
        pattern: String,
        /// Compiler diagnostic
        reason: String,
    },

    /// Backup copy failed before a commit; the primary store file is untouched
    #[error("failed to write store backup {path}: {reason}")]
    BackupWrite {
        /// Path of the backup file that could not be written
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },

    /// Feed source unreadable or unparseable as RSS or Atom
    #[error("feed error: {0}")]
    Feed(String),

    /// Tracker login was rejected
    #[error("login rejected with HTTP {status}")]
    Login {
        /// HTTP status code returned by the login endpoint
        status: u16,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
