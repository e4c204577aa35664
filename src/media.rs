//! Renders slides into the host media surfaces and reports play durations.
//!
//! The adapter is the only component that touches the image, video and text
//! rendering targets. For image and text slides the effective duration is
//! simply the slide's nominal duration. For video slides it is the actual
//! media length, which may resolve asynchronously: the adapter tags each
//! pending wait with the scheduler's generation so a resolution arriving
//! after the user navigated away is discarded instead of restarting a torn
//! down slide.
//!
//! Autoplay policy: video playback starts with audio enabled. If the
//! platform rejects that, one muted retry follows and the muted state is
//! reported upward so the mute toggle stays consistent. If the muted attempt
//! is rejected too, the slide still renders as a paused frame and the
//! duration falls back to whatever is known (cached metadata, else nominal)
//! so playback never gets stuck on a broken video.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, info, trace, warn};

use crate::clock::Generation;
use crate::errors::MediaError;
use crate::model::{Slide, SlideKind};

/// The host-owned rendering targets for slide media.
///
/// Implementations typically wrap an image region, a video region and a text
/// region inside the viewer modal. The core assumes the regions exist; it
/// never creates them.
pub trait MediaSurface {
    /// Shows the image region with the given source.
    fn show_image(&mut self, source: &str);

    /// Shows the text region with the given body.
    fn show_text(&mut self, body: &str);

    /// Loads the video region with the given source, rewinds it and attempts
    /// autoplay with the given mute flag.
    ///
    /// `generation` tags this render request: if the video's metadata is not
    /// yet cached, the host must echo the tag when the metadata arrives (via
    /// `StoryViewer::video_metadata_loaded`) so late arrivals for torn-down
    /// slides can be discarded.
    ///
    /// # Errors
    /// `MediaError::AutoplayBlocked` if the platform rejected the play
    /// attempt; other variants for sources that cannot be loaded at all.
    fn begin_video(&mut self, source: &str, muted: bool, generation: Generation)
        -> Result<(), MediaError>;

    /// The video's media length in milliseconds, if its metadata is already
    /// available. `None` means it will be delivered later through
    /// `StoryViewer::video_metadata_loaded`.
    fn cached_video_duration_ms(&self) -> Option<u64>;

    /// Pauses video playback, keeping the current position.
    fn pause_video(&mut self);

    /// Resumes video playback from the current position.
    fn resume_video(&mut self);

    /// Pauses video playback and rewinds to the first frame.
    fn halt_video(&mut self);

    /// Applies the mute flag to the video region.
    fn set_video_muted(&mut self, muted: bool);
}

// Media surfaces are typically shared with the host loop; single-threaded
// model, so `Rc<RefCell<_>>` forwards.
impl<S: MediaSurface> MediaSurface for Rc<RefCell<S>> {
    fn show_image(&mut self, source: &str) {
        self.borrow_mut().show_image(source);
    }
    fn show_text(&mut self, body: &str) {
        self.borrow_mut().show_text(body);
    }
    fn begin_video(&mut self, source: &str, muted: bool, generation: Generation)
        -> Result<(), MediaError>
    {
        self.borrow_mut().begin_video(source, muted, generation)
    }
    fn cached_video_duration_ms(&self) -> Option<u64> {
        self.borrow().cached_video_duration_ms()
    }
    fn pause_video(&mut self) {
        self.borrow_mut().pause_video();
    }
    fn resume_video(&mut self) {
        self.borrow_mut().resume_video();
    }
    fn halt_video(&mut self) {
        self.borrow_mut().halt_video();
    }
    fn set_video_muted(&mut self, muted: bool) {
        self.borrow_mut().set_video_muted(muted);
    }
}

/// How the effective duration of a freshly rendered slide is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderTiming {
    /// Duration known now; the advance timer can be armed immediately.
    Ready { duration_ms: u64 },
    /// Video metadata still resolving; the advance timer must wait for
    /// `MediaAdapter::resolve_metadata` with the matching generation.
    PendingMetadata,
}

/// Result of rendering one slide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderReport {
    pub timing: RenderTiming,
    /// Whether the video ended up muted (autoplay fallback). Always false
    /// for image and text slides.
    pub video_muted: bool,
}

/// Renders slides and tracks the single in-flight video metadata wait.
pub struct MediaAdapter {
    surface: Box<dyn MediaSurface>,
    pending_metadata: Option<Generation>,
}

impl MediaAdapter {
    pub fn new(surface: Box<dyn MediaSurface>) -> Self {
        Self { surface, pending_metadata: None }
    }

    /// Renders `slide` into its surface and reports how its duration is
    /// known. `generation` tags a possible metadata wait.
    pub fn render(&mut self, slide: &Slide, generation: Generation) -> RenderReport {
        self.pending_metadata = None;
        match slide.kind {
            SlideKind::Image => {
                trace!("Rendering image slide: {}", slide.source);
                self.surface.show_image(&slide.source);
                RenderReport {
                    timing: RenderTiming::Ready { duration_ms: slide.nominal_duration_ms },
                    video_muted: false,
                }
            }
            SlideKind::Text => {
                trace!("Rendering text slide ({} chars)", slide.text.len());
                self.surface.show_text(&slide.text);
                RenderReport {
                    timing: RenderTiming::Ready { duration_ms: slide.nominal_duration_ms },
                    video_muted: false,
                }
            }
            SlideKind::Video => self.render_video(slide, generation),
        }
    }

    fn render_video(&mut self, slide: &Slide, generation: Generation) -> RenderReport {
        let mut muted = false;
        if let Err(e) = self.surface.begin_video(&slide.source, false, generation) {
            warn!("Video autoplay with audio rejected for '{}': {}. Retrying muted.", slide.source, e);
            muted = true;
            if let Err(e) = self.surface.begin_video(&slide.source, true, generation) {
                // Paused frame; fall back to a known duration so playback
                // never gets stuck waiting on a video that will not play.
                error!("Muted autoplay also rejected for '{}': {}", slide.source, e);
                let duration_ms = self
                    .surface
                    .cached_video_duration_ms()
                    .unwrap_or(slide.nominal_duration_ms);
                return RenderReport {
                    timing: RenderTiming::Ready { duration_ms },
                    video_muted: muted,
                };
            }
        }

        match self.surface.cached_video_duration_ms() {
            Some(duration_ms) => {
                debug!("Video metadata cached for '{}': {}ms", slide.source, duration_ms);
                RenderReport { timing: RenderTiming::Ready { duration_ms }, video_muted: muted }
            }
            None => {
                debug!(
                    "Video metadata pending for '{}' (generation {})",
                    slide.source, generation
                );
                self.pending_metadata = Some(generation);
                RenderReport { timing: RenderTiming::PendingMetadata, video_muted: muted }
            }
        }
    }

    /// Accepts a metadata resolution for `generation`. Returns false (and
    /// does nothing) when the wait was abandoned or belongs to a slide that
    /// has since been torn down.
    pub fn resolve_metadata(&mut self, generation: Generation) -> bool {
        match self.pending_metadata {
            Some(pending) if pending == generation => {
                self.pending_metadata = None;
                true
            }
            _ => {
                debug!("Discarding stale video metadata resolution (generation {})", generation);
                false
            }
        }
    }

    /// Abandons any in-flight metadata wait.
    pub fn abandon_pending(&mut self) {
        if let Some(generation) = self.pending_metadata.take() {
            debug!("Abandoning video metadata wait (generation {})", generation);
        }
    }

    /// Tears down the outgoing slide. A previous slide's video must never
    /// keep playing in the background.
    pub fn teardown(&mut self, slide: &Slide) {
        if slide.kind == SlideKind::Video {
            trace!("Pausing outgoing video '{}'", slide.source);
            self.surface.pause_video();
        }
    }

    /// Pauses the current slide's playback, if it is a video.
    pub fn pause(&mut self, slide: &Slide) {
        if slide.kind == SlideKind::Video {
            self.surface.pause_video();
        }
    }

    /// Resumes the current slide's playback, if it is a video.
    pub fn resume(&mut self, slide: &Slide) {
        if slide.kind == SlideKind::Video {
            self.surface.resume_video();
        }
    }

    /// Stops and rewinds the video region (viewer closed or stopped).
    pub fn halt(&mut self) {
        info!("Halting media playback");
        self.surface.halt_video();
    }

    /// Applies the mute flag to the video region.
    pub fn set_muted(&mut self, muted: bool) {
        self.surface.set_video_muted(muted);
    }

    /// Whether a metadata wait is outstanding.
    pub fn has_pending_metadata(&self) -> bool {
        self.pending_metadata.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Slide;
    use crate::test_support::{MediaCall, RecordingMediaSurface};

    fn adapter_with_surface() -> (MediaAdapter, Rc<RefCell<RecordingMediaSurface>>) {
        let surface = Rc::new(RefCell::new(RecordingMediaSurface::default()));
        (MediaAdapter::new(Box::new(surface.clone())), surface)
    }

    #[test]
    fn image_and_text_report_nominal_duration() {
        let (mut adapter, surface) = adapter_with_surface();

        let image = Slide::image("a.jpg", 4000);
        let report = adapter.render(&image, 1);
        assert_eq!(report.timing, RenderTiming::Ready { duration_ms: 4000 });
        assert!(!report.video_muted);

        let text = Slide::text("hello", 3000);
        let report = adapter.render(&text, 2);
        assert_eq!(report.timing, RenderTiming::Ready { duration_ms: 3000 });

        let calls = surface.borrow().calls.clone();
        assert!(calls.contains(&MediaCall::ShowImage("a.jpg".into())));
        assert!(calls.contains(&MediaCall::ShowText("hello".into())));
    }

    #[test]
    fn cached_video_metadata_resolves_immediately() {
        let (mut adapter, surface) = adapter_with_surface();
        surface.borrow_mut().cached_duration = Some(12_000);

        let report = adapter.render(&Slide::video("clip.mp4"), 3);
        assert_eq!(report.timing, RenderTiming::Ready { duration_ms: 12_000 });
        assert!(!adapter.has_pending_metadata());
    }

    #[test]
    fn uncached_video_metadata_is_pending_until_resolved() {
        let (mut adapter, _surface) = adapter_with_surface();

        let report = adapter.render(&Slide::video("clip.mp4"), 5);
        assert_eq!(report.timing, RenderTiming::PendingMetadata);
        assert!(adapter.has_pending_metadata());

        // Stale generation is discarded, current one accepted exactly once.
        assert!(!adapter.resolve_metadata(4));
        assert!(adapter.resolve_metadata(5));
        assert!(!adapter.resolve_metadata(5));
    }

    #[test]
    fn abandoned_wait_ignores_late_resolution() {
        let (mut adapter, _surface) = adapter_with_surface();
        adapter.render(&Slide::video("clip.mp4"), 8);
        adapter.abandon_pending();
        assert!(!adapter.resolve_metadata(8));
    }

    #[test]
    fn autoplay_rejection_falls_back_to_muted() {
        let (mut adapter, surface) = adapter_with_surface();
        surface.borrow_mut().reject_unmuted_autoplay = true;
        surface.borrow_mut().cached_duration = Some(9_000);

        let report = adapter.render(&Slide::video("clip.mp4"), 1);
        assert!(report.video_muted);
        assert_eq!(report.timing, RenderTiming::Ready { duration_ms: 9_000 });

        let calls = surface.borrow().calls.clone();
        assert!(calls.contains(&MediaCall::BeginVideo { source: "clip.mp4".into(), muted: false }));
        assert!(calls.contains(&MediaCall::BeginVideo { source: "clip.mp4".into(), muted: true }));
    }

    #[test]
    fn double_autoplay_rejection_still_arms_on_nominal_duration() {
        let (mut adapter, surface) = adapter_with_surface();
        surface.borrow_mut().reject_unmuted_autoplay = true;
        surface.borrow_mut().reject_muted_autoplay = true;

        let mut slide = Slide::video("clip.mp4");
        slide.nominal_duration_ms = 5000;
        let report = adapter.render(&slide, 1);
        // Never stuck: timing resolves even though nothing plays.
        assert_eq!(report.timing, RenderTiming::Ready { duration_ms: 5000 });
        assert!(report.video_muted);
        assert!(!adapter.has_pending_metadata());
    }

    #[test]
    fn teardown_pauses_only_videos() {
        let (mut adapter, surface) = adapter_with_surface();
        adapter.teardown(&Slide::image("a.jpg", 1000));
        assert!(!surface.borrow().calls.contains(&MediaCall::PauseVideo));

        adapter.teardown(&Slide::video("clip.mp4"));
        assert!(surface.borrow().calls.contains(&MediaCall::PauseVideo));
    }

    #[test]
    fn rendering_a_new_slide_abandons_a_previous_wait() {
        let (mut adapter, _surface) = adapter_with_surface();
        adapter.render(&Slide::video("first.mp4"), 1);
        assert!(adapter.has_pending_metadata());

        adapter.render(&Slide::image("a.jpg", 1000), 2);
        assert!(!adapter.resolve_metadata(1));
    }
}
