//! Defines the core data structures used by the stories viewer.
//!
//! This includes the slide model, the playlist assembled from the external
//! story feed, and the playback phase enum owned by the scheduler.

use serde::Deserialize;

use log::{debug, warn};

/// Display time applied when an entry carries no usable duration.
pub const DEFAULT_DURATION_MS: u64 = 5_000;

/// Source of the built-in slide shown when the feed yields nothing.
pub const FALLBACK_STORY_SOURCE: &str = "Media/Images/story.jpg";

/// The kind of one playable story unit.
///
/// A closed set: the media adapter matches exhaustively on it, so adding a
/// new kind is a compile-time-checked extension point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlideKind {
    Image,
    Video,
    Text,
}

/// A single playable unit of the story. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slide {
    pub kind: SlideKind,
    /// Media URL. Required (non-empty) for image and video slides; text
    /// slides may leave it empty.
    pub source: String,
    /// Body of a text card. Unused for image and video slides.
    pub text: String,
    /// Display time in milliseconds. For videos this is only the fallback
    /// used until (or unless) the actual media length resolves.
    pub nominal_duration_ms: u64,
}

impl Slide {
    pub fn image(source: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            kind: SlideKind::Image,
            source: source.into(),
            text: String::new(),
            nominal_duration_ms: duration_ms,
        }
    }

    pub fn video(source: impl Into<String>) -> Self {
        Self {
            kind: SlideKind::Video,
            source: source.into(),
            text: String::new(),
            nominal_duration_ms: DEFAULT_DURATION_MS,
        }
    }

    pub fn text(body: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            kind: SlideKind::Text,
            source: String::new(),
            text: body.into(),
            nominal_duration_ms: duration_ms,
        }
    }
}

/// One entry of the inbound story feed, as delivered by the external content
/// API. Unknown fields are ignored; missing fields take defaults so a
/// partially filled entry still normalizes instead of failing the whole feed.
#[derive(Deserialize, Clone, Debug)]
pub struct StoryEntry {
    /// The declared kind: "image", "video" or "text". Anything else is
    /// treated as an image.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
    /// Duration in milliseconds; zero or missing falls back to the default.
    #[serde(default)]
    pub duration: u64,
}

/// The fixed, ordered, non-empty sequence of slides for one viewing session.
///
/// Non-emptiness is enforced at construction: a feed that normalizes to
/// nothing is replaced by [`Playlist::fallback`], so downstream code never
/// has to handle an empty playlist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playlist {
    slides: Vec<Slide>,
}

impl Playlist {
    /// Builds a playlist from raw feed entries, applying the inbound data
    /// contract: unrecognized kinds become images, entries without a source
    /// are dropped unless they are text cards, and zero durations take the
    /// default. An empty result substitutes the built-in default slide.
    pub fn from_entries(entries: Vec<StoryEntry>) -> Self {
        let mut slides = Vec::with_capacity(entries.len());
        for entry in entries {
            let kind = match entry.kind.to_lowercase().as_str() {
                "image" => SlideKind::Image,
                "video" => SlideKind::Video,
                "text" => SlideKind::Text,
                other => {
                    warn!("Unrecognized story type '{}'; treating as image", other);
                    SlideKind::Image
                }
            };
            if entry.url.is_empty() && kind != SlideKind::Text {
                warn!("Dropping {:?} story entry with empty url", kind);
                continue;
            }
            let duration = if entry.duration == 0 { DEFAULT_DURATION_MS } else { entry.duration };
            slides.push(Slide {
                kind,
                source: entry.url,
                text: entry.text,
                nominal_duration_ms: duration,
            });
        }
        Self::from_slides(slides)
    }

    /// Builds a playlist from already-constructed slides, enforcing the
    /// source invariant and the non-emptiness fallback.
    pub fn from_slides(slides: Vec<Slide>) -> Self {
        let slides: Vec<Slide> = slides
            .into_iter()
            .filter(|slide| {
                let keep = slide.kind == SlideKind::Text || !slide.source.is_empty();
                if !keep {
                    warn!("Excluding {:?} slide with empty source from playlist", slide.kind);
                }
                keep
            })
            .collect();
        if slides.is_empty() {
            debug!("Playlist empty after filtering; substituting built-in default story");
            return Self::fallback();
        }
        Self { slides }
    }

    /// The built-in single-slide playlist used when the feed is empty,
    /// malformed or unreachable.
    pub fn fallback() -> Self {
        Self {
            slides: vec![Slide::image(FALLBACK_STORY_SOURCE, DEFAULT_DURATION_MS)],
        }
    }

    /// Number of slides. Always at least 1.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false: playlists are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn slide(&self, index: usize) -> &Slide {
        &self.slides[index]
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.slides.len()
    }
}

/// The lifecycle phase of the playback state machine.
///
/// `Advancing` is the window where a video slide is rendered but its advance
/// timer is not armed yet because the media length is still resolving.
/// `Closed` is terminal for a viewing session; a fresh `start()` re-enters
/// at `Idle` → `Playing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing,
    Paused,
    Advancing,
    Closed,
}
