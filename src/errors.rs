//! Defines the custom error types used throughout the `stories_rs` crate.
//!
//! This module centralizes error handling, providing specific error enums for
//! different categories of issues (configuration, story feed, media playback),
//! and a top-level `StoryError` to wrap them if needed. Each error type
//! implements `Debug`, `Display`, and `std::error::Error`, and provides `From`
//! implementations for common underlying error types.
//!
//! Note that most failures in this crate never reach the embedder as errors:
//! a broken or empty story feed degrades to the built-in default playlist, and
//! a rejected video autoplay degrades to a muted retry (see `feed` and
//! `media`). The types here exist for the boundaries where a caller does want
//! to observe what went wrong, and for logging.

use std::error::Error as StdError;
use std::fmt;

// --- ConfigError ---
/// Errors related to viewer configuration loading and parsing.
#[must_use = "a configuration error should be handled or propagated"]
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred while trying to read the configuration file.
    Io(std::io::Error),
    /// An error occurred while parsing the configuration file content.
    Parse(String),
    /// A required configuration key was missing from the file.
    MissingKey(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Configuration parse error: {}", e),
            ConfigError::MissingKey(key) => write!(f, "Missing configuration key: '{}'", key),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

// --- FeedError ---
/// Errors related to fetching and decoding the story feed.
#[must_use = "a feed error should be handled or propagated"]
#[derive(Debug)]
pub enum FeedError {
    /// An error occurred during an HTTP request made by `reqwest`.
    Request(reqwest::Error),
    /// An HTTP error status was returned by the feed endpoint.
    Http { status: reqwest::StatusCode, message: String },
    /// The feed body could not be decoded as a story entry list.
    Json(serde_json::Error),
    /// A generic feed error not covered by other variants.
    Generic(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Request(e) => write!(f, "Story feed request error: {}", e),
            FeedError::Http { status, message } => {
                write!(f, "Story feed HTTP error {}: {}", status, message)
            }
            FeedError::Json(e) => write!(f, "Story feed decode error: {}", e),
            FeedError::Generic(s) => write!(f, "Story feed error: {}", s),
        }
    }
}

impl StdError for FeedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FeedError::Request(e) => Some(e),
            FeedError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Request(err)
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Json(err)
    }
}

// --- MediaError ---
/// Errors related to media playback on the host surface.
#[must_use = "a media error should be handled or propagated"]
#[derive(Debug)]
pub enum MediaError {
    /// The platform rejected an autoplay attempt (typically autoplay with
    /// audio; the adapter retries muted before giving up).
    AutoplayBlocked(String),
    /// The media source could not be loaded or played.
    Unavailable(String),
    /// A generic media-related error.
    Generic(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::AutoplayBlocked(s) => write!(f, "Autoplay rejected: {}", s),
            MediaError::Unavailable(s) => write!(f, "Media unavailable: {}", s),
            MediaError::Generic(s) => write!(f, "Media error: {}", s),
        }
    }
}

impl StdError for MediaError {}

// --- StoryError (Top-level error enum) ---
/// A top-level error type that can encompass any error within the crate.
#[must_use = "a story viewer error should be handled or propagated"]
#[derive(Debug)]
pub enum StoryError {
    Config(ConfigError),
    Feed(FeedError),
    Media(MediaError),
    Generic(String),
}

impl fmt::Display for StoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryError::Config(e) => write!(f, "Story viewer configuration error: {}", e),
            StoryError::Feed(e) => write!(f, "Story viewer feed error: {}", e),
            StoryError::Media(e) => write!(f, "Story viewer media error: {}", e),
            StoryError::Generic(s) => write!(f, "Story viewer error: {}", s),
        }
    }
}

impl StdError for StoryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoryError::Config(e) => Some(e),
            StoryError::Feed(e) => Some(e),
            StoryError::Media(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for StoryError {
    fn from(err: ConfigError) -> Self {
        StoryError::Config(err)
    }
}
impl From<FeedError> for StoryError {
    fn from(err: FeedError) -> Self {
        StoryError::Feed(err)
    }
}
impl From<MediaError> for StoryError {
    fn from(err: MediaError) -> Self {
        StoryError::Media(err)
    }
}
