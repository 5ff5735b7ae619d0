//! Feed reading: fetch a feed source and parse it into entries.
//!
//! The source is either an HTTP(S) URL or a local file path (a saved copy of
//! the feed works exactly like the live one). Content is parsed as RSS 2.0
//! first, falling back to Atom. Entry descriptions arrive as HTML markup and
//! are converted to plain text here, before classification ever sees them.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

/// One parsed feed entry, before reconciliation against the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedEntry {
    /// Entry title
    pub title: String,

    /// Item page URL
    pub page_url: String,

    /// Publication instant, timezone-naive (UTC)
    pub timestamp: NaiveDateTime,

    /// Plain-text description, converted from the feed's HTML summary
    pub description: String,
}

/// Fetch and parse the feed source.
///
/// # Errors
///
/// Returns [`Error::Feed`] if the source cannot be read (HTTP failure or
/// non-success status, unreadable file) or parses as neither RSS nor Atom.
pub async fn fetch_entries(client: &reqwest::Client, source: &str) -> Result<Vec<FeedEntry>> {
    let content = if is_http_source(source) {
        debug!(url = %source, "fetching feed");
        let response = client
            .get(source)
            .send()
            .await
            .map_err(|e| Error::Feed(format!("failed to fetch feed '{}': {}", source, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Feed(format!(
                "feed returned HTTP {}: {}",
                status.as_u16(),
                source
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Feed(format!("failed to read feed content: {}", e)))?
    } else {
        debug!(path = %source, "reading feed file");
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| Error::Feed(format!("failed to read feed file '{}': {}", source, e)))?
    };

    parse_entries(&content)
}

/// Parse feed content, trying RSS first and falling back to Atom.
pub fn parse_entries(content: &str) -> Result<Vec<FeedEntry>> {
    match parse_as_rss(content) {
        Ok(entries) => {
            debug!(entries = entries.len(), "parsed feed as RSS");
            Ok(entries)
        }
        Err(rss_err) => match parse_as_atom(content) {
            Ok(entries) => {
                debug!(entries = entries.len(), "parsed feed as Atom");
                Ok(entries)
            }
            Err(atom_err) => Err(Error::Feed(format!(
                "failed to parse feed as RSS or Atom. RSS error: {}. Atom error: {}",
                rss_err, atom_err
            ))),
        },
    }
}

fn is_http_source(source: &str) -> bool {
    match url::Url::parse(source) {
        Ok(parsed) => parsed.scheme() == "http" || parsed.scheme() == "https",
        Err(_) => false,
    }
}

fn parse_as_rss(content: &str) -> std::result::Result<Vec<FeedEntry>, String> {
    let channel = content
        .parse::<rss::Channel>()
        .map_err(|e| format!("RSS parse error: {}", e))?;

    let entries = channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.to_string();
            let page_url = match item.link() {
                Some(link) => link.to_string(),
                None => {
                    warn!(title = %title, "feed entry has no link, skipping");
                    return None;
                }
            };
            let timestamp = match item.pub_date().and_then(parse_published) {
                Some(ts) => ts,
                None => {
                    warn!(title = %title, "feed entry has no parseable publication date, skipping");
                    return None;
                }
            };
            let description = item.description().map(html_to_text).unwrap_or_default();

            Some(FeedEntry {
                title,
                page_url,
                timestamp,
                description,
            })
        })
        .collect();

    Ok(entries)
}

fn parse_as_atom(content: &str) -> std::result::Result<Vec<FeedEntry>, String> {
    let feed = atom_syndication::Feed::read_from(content.as_bytes())
        .map_err(|e| format!("Atom parse error: {}", e))?;

    let entries = feed
        .entries()
        .iter()
        .filter_map(|entry| {
            let title = entry.title().as_str().to_string();
            let page_url = match entry.links().first() {
                Some(link) => link.href().to_string(),
                None => {
                    warn!(title = %title, "feed entry has no link, skipping");
                    return None;
                }
            };
            // Prefer published, fall back to updated
            let timestamp = entry
                .published()
                .copied()
                .unwrap_or_else(|| *entry.updated())
                .naive_utc();
            let description = entry
                .summary()
                .map(|s| html_to_text(s.as_str()))
                .or_else(|| entry.content().and_then(|c| c.value().map(html_to_text)))
                .unwrap_or_default();

            Some(FeedEntry {
                title,
                page_url,
                timestamp,
                description,
            })
        })
        .collect();

    Ok(entries)
}

/// Parse an RFC 2822 publication date, normalized to a timezone-naive UTC
/// instant.
fn parse_published(text: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Convert feed HTML markup to plain text: tags are dropped (`<br>` and
/// closing `</p>` become line breaks), then HTML entities are decoded.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => {
                let tag = rest[start + 1..start + end].trim().to_ascii_lowercase();
                if tag.starts_with("br") || tag == "/p" {
                    text.push('\n');
                }
                rest = &rest[start + end + 1..];
            }
            None => {
                // Unterminated tag: nothing after it can be text
                rest = "";
            }
        }
    }
    text.push_str(rest);
    html_escape::decode_html_entities(&text).trim().to_string()
}

/// Pull the genre out of a `Style:` line in an item description, for the run
/// summary listing. Returns `<unknown>` when the description has none.
pub fn style_from_description(description: &str) -> String {
    for raw_line in description.lines() {
        let line = raw_line.replace('*', "");
        let lower = line.to_ascii_lowercase();
        if let Some(pos) = lower.find("style:") {
            return line[pos + "style:".len()..].trim().to_string();
        }
    }
    "<unknown>".to_string()
}
