//! Tracker session login.
//!
//! The session is plain composition: [`login`] builds an HTTP client with a
//! cookie jar, posts the login form once, and hands the client to whoever
//! needs it (the feed reader and the torrent fetcher share it). Components
//! never know how the session was established.

use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Build the HTTP client and establish the tracker session.
///
/// With no credentials configured the client is returned as-is, anonymous:
/// feed reading still works against public feeds, and torrent fetches will
/// come back `Failed`/`NotReady` until the operator supplies credentials.
///
/// # Errors
///
/// Returns [`Error::Login`] if the login endpoint answers with a
/// non-success status, or [`Error::Network`] on transport failure.
pub async fn login(config: &TrackerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?;

    let (username, password) = match (&config.username, &config.password) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            warn!("no tracker credentials configured, continuing without login");
            return Ok(client);
        }
    };

    debug!(url = %config.login_url, username = %username, "logging in to tracker");
    let form = [
        ("UserLogin[username]", username.as_str()),
        ("UserLogin[password]", password.as_str()),
        ("submit", "Enter"),
    ];
    let response = client.post(&config.login_url).form(&form).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Login {
            status: status.as_u16(),
        });
    }

    info!("tracker login succeeded");
    Ok(client)
}
