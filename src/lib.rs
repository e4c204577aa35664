//! Playback core for a "stories" viewer: a modal that plays a timed
//! sequence of slides (images, short videos, text cards) with per-slide
//! progress indicators, hold-to-pause, tap navigation and a mute toggle.
//!
//! The crate owns the state machine only. Everything the platform does (the
//! modal chrome, the actual image/video/text regions, the progress bar
//! strip, timers) is reached through small traits the host implements
//! ([`MediaSurface`], [`ProgressSurface`], [`Timer`], [`Clock`],
//! [`ShellSink`]), which keeps the whole playback flow deterministic and
//! unit-testable without a real clock.
//!
//! Typical wiring:
//! 1. load a [`ViewerConfig`] (or use the defaults),
//! 2. fetch the session [`Playlist`] through [`feed::fetch_playlist`]
//!    (falls back to a built-in slide when the feed is down),
//! 3. build a [`StoryViewer`] from the host surfaces and timers,
//! 4. on modal open call [`StoryViewer::open`], route raw press/release
//!    events and timer fires in, and close the modal when the shell's
//!    [`ShellSink::playlist_exhausted`] fires.

pub mod clock;
pub mod config;
pub mod errors;
pub mod feed;
pub mod input;
pub mod media;
pub mod model;
pub mod progress;
pub mod scheduler;
pub mod viewer;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, DeadlineTimer, Generation, ManualClock, MonotonicClock, Timer};
pub use config::{load_config, ViewerConfig};
pub use errors::{ConfigError, FeedError, MediaError, StoryError};
pub use input::{GestureAction, GestureConfig, InputController, NavSide};
pub use media::{MediaAdapter, MediaSurface, RenderReport, RenderTiming};
pub use model::{Phase, Playlist, Slide, SlideKind, StoryEntry};
pub use progress::{BarPhase, ProgressSurface, ProgressTrack};
pub use scheduler::{PlaybackScheduler, ShellSink};
pub use viewer::StoryViewer;
