//! Handles viewer configuration loading and management.
//!
//! This module defines the `ViewerConfig` struct which holds configuration
//! parameters like the story feed URL and the gesture timing thresholds. It
//! provides the `load_config` function to read these settings from an INI
//! file; embedders that configure in code can start from
//! `ViewerConfig::default()` instead.

use configparser::ini::Ini;

use log::{debug, error, info};

use crate::errors::ConfigError;
use crate::model::DEFAULT_DURATION_MS;

/// Press duration after which a hold engages pause, in milliseconds.
pub const DEFAULT_PAUSE_INTENT_MS: u64 = 150;

/// Press-to-release duration below which a release navigates, in
/// milliseconds.
pub const DEFAULT_TAP_THRESHOLD_MS: u64 = 200;

/// Holds the viewer's configuration parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Endpoint serving the normalized story entry list.
    pub feed_url: String,
    /// Display time for slides that carry no usable duration.
    pub default_duration_ms: u64,
    /// Hold duration before pause engages.
    pub pause_intent_ms: u64,
    /// Maximum press duration still classified as a navigation tap.
    pub tap_threshold_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            feed_url: "/api/stories".to_string(),
            default_duration_ms: DEFAULT_DURATION_MS,
            pause_intent_ms: DEFAULT_PAUSE_INTENT_MS,
            tap_threshold_ms: DEFAULT_TAP_THRESHOLD_MS,
        }
    }
}

/// Loads viewer configuration from the specified INI file path.
///
/// Reads settings from the `[stories]` section. `feed_url` is required; the
/// timing keys are optional and fall back to their defaults.
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read, is malformed, or if
/// `feed_url` is missing.
#[must_use = "loading configuration can fail, the Result must be handled"]
pub fn load_config(path: &str) -> Result<ViewerConfig, ConfigError> {
    info!("Attempting to load config from: {}", path);
    let mut config_parser = Ini::new();

    config_parser.load(path).map_err(|e| {
        error!("Error loading config file '{}': {}", path, e);
        if e.to_lowercase().contains("os error 2") || e.to_lowercase().contains("failed to read file") {
            ConfigError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, e))
        } else {
            ConfigError::Parse(e)
        }
    })?;

    let feed_url = config_parser.get("stories", "feed_url").ok_or_else(|| {
        error!("Missing configuration key 'feed_url' in section '[stories]' of file '{}'", path);
        ConfigError::MissingKey("feed_url".to_string())
    })?;
    debug!("Loaded config value for key 'feed_url': {}", feed_url);

    // Optional timing keys; absent keys keep their defaults, unparsable
    // values are an error rather than silently ignored.
    let get_ms = |key_name: &str, default: u64| -> Result<u64, ConfigError> {
        let value = config_parser.getuint("stories", key_name).map_err(|e| {
            error!("Invalid value for configuration key '{}' in '{}': {}", key_name, path, e);
            ConfigError::Parse(format!("key '{}': {}", key_name, e))
        })?;
        match value {
            Some(ms) => {
                debug!("Loaded config value for key '{}': {}", key_name, ms);
                Ok(ms)
            }
            None => Ok(default),
        }
    };

    let viewer_config = ViewerConfig {
        feed_url,
        default_duration_ms: get_ms("default_duration_ms", DEFAULT_DURATION_MS)?,
        pause_intent_ms: get_ms("pause_intent_ms", DEFAULT_PAUSE_INTENT_MS)?,
        tap_threshold_ms: get_ms("tap_threshold_ms", DEFAULT_TAP_THRESHOLD_MS)?,
    };
    info!("Configuration loaded successfully from {}: {:?}", path, viewer_config);
    Ok(viewer_config)
}
