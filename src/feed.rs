//! Fetches the story feed and assembles the session playlist.
//!
//! The feed endpoint serves an already-transformed, ordered list of story
//! entries (see [`StoryEntry`]); this module is the crate's only network
//! boundary. It is deliberately forgiving: any failure (unreachable
//! endpoint, error status, undecodable body, empty list) degrades to the
//! built-in default playlist and is only logged, never surfaced to the
//! person watching the stories.

use log::{debug, error, info, warn};
use reqwest::Client;

use crate::config::ViewerConfig;
use crate::errors::FeedError;
use crate::model::{Playlist, StoryEntry};

/// Fetches the raw story entries from the configured feed endpoint.
#[must_use = "fetching the feed can fail; the Result must be handled"]
pub async fn fetch_entries(config: &ViewerConfig, client: &Client) -> Result<Vec<StoryEntry>, FeedError> {
    debug!("Fetching story feed from: {}", config.feed_url);
    let response = client.get(&config.feed_url).send().await.map_err(|e| {
        error!("Request error fetching story feed from {}: {:?}", config.feed_url, e);
        FeedError::Request(e)
    })?;

    let response = response.error_for_status().map_err(|e| {
        let status = e.status().unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        error!("HTTP error {} fetching story feed from {}: {}", status, config.feed_url, e);
        FeedError::Http { status, message: e.to_string() }
    })?;

    let body = response.text().await.map_err(FeedError::Request)?;
    let entries = serde_json::from_str::<Vec<StoryEntry>>(&body).map_err(|e| {
        error!("Failed to decode story feed from {}: {:?}", config.feed_url, e);
        FeedError::Json(e)
    })?;
    info!("Fetched {} story entries from {}", entries.len(), config.feed_url);
    Ok(entries)
}

/// Fetches and normalizes the session playlist. Never fails: a broken or
/// empty feed yields the built-in single-slide default.
pub async fn fetch_playlist(config: &ViewerConfig, client: &Client) -> Playlist {
    match fetch_entries(config, client).await {
        Ok(entries) if !entries.is_empty() => Playlist::from_entries(entries),
        Ok(_) => {
            warn!("Story feed at {} returned no entries; using the built-in default story", config.feed_url);
            Playlist::fallback()
        }
        Err(e) => {
            error!("Story feed fetch failed: {}. Falling back to the built-in default story.", e);
            Playlist::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init_logging;

    fn unreachable_config() -> ViewerConfig {
        ViewerConfig {
            // Reserved port on loopback: connections are refused immediately.
            feed_url: "http://127.0.0.1:1/api/stories".to_string(),
            ..ViewerConfig::default()
        }
    }

    #[tokio::test]
    async fn unreachable_feed_falls_back_to_default_playlist() {
        init_logging();
        let client = Client::new();
        let playlist = fetch_playlist(&unreachable_config(), &client).await;
        assert_eq!(playlist, Playlist::fallback());
    }

    #[tokio::test]
    async fn fetch_entries_reports_the_underlying_error() {
        init_logging();
        let client = Client::new();
        match fetch_entries(&unreachable_config(), &client).await {
            Err(FeedError::Request(_)) => {}
            other => panic!("expected FeedError::Request, got {:?}", other.map(|e| e.len())),
        }
    }
}
