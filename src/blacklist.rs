//! Content blacklist compiled from a single pattern specification.
//!
//! The specification file may spread the pattern over several lines for
//! readability; line breaks are removed before compilation, so a file like
//!
//! ```text
//! doom|sludge|
//! funeral
//! ```
//!
//! compiles to the single pattern `doom|sludge|funeral`, matched
//! case-insensitively anywhere in an item's description.

use crate::error::{Error, Result};
use crate::types::TrackerItem;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Compiled-DFA size limit, guarding against pathological patterns
const PATTERN_SIZE_LIMIT: usize = 1024 * 1024;

/// A compiled case-insensitive description filter.
pub struct Blacklist {
    pattern: String,
    regex: Regex,
}

impl Blacklist {
    /// Compile a blacklist from its textual specification.
    ///
    /// Leading/trailing whitespace is trimmed and embedded line breaks are
    /// removed before compilation. Compilation failure is fatal here, at
    /// construction, rather than surfacing later on first match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the specification is not a valid
    /// regular expression.
    pub fn compile(spec: &str) -> Result<Self> {
        let pattern: String = spec.trim().replace(['\r', '\n'], "");
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;

        debug!(pattern = %pattern, "compiled blacklist");
        Ok(Self { pattern, regex })
    }

    /// Read and compile the blacklist specification file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let spec = tokio::fs::read_to_string(path).await?;
        Self::compile(&spec)
    }

    /// The normalized pattern text this blacklist was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern occurs anywhere in `description`.
    pub fn matches(&self, description: &str) -> bool {
        self.regex.is_match(description)
    }

    /// Partition `items` into (whitelisted, blacklisted) by matching each
    /// item's description, looked up by title. An item with no description
    /// is matched against empty text, which a non-empty pattern never hits.
    pub fn split(
        &self,
        items: Vec<TrackerItem>,
        descriptions: &HashMap<String, String>,
    ) -> (Vec<TrackerItem>, Vec<TrackerItem>) {
        items.into_iter().partition(|item| {
            let description = descriptions
                .get(&item.title)
                .map(String::as_str)
                .unwrap_or("");
            !self.matches(description)
        })
    }
}
