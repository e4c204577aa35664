//! The playback state machine for one story viewing session.
//!
//! `PlaybackScheduler` owns the whole mutable playback state: the current
//! index, the phase, the elapsed-time accounting and the single pending
//! advance timer. Every other component either renders on its behalf (media
//! adapter, progress track) or issues commands into it (input controller,
//! viewer shell); nothing else mutates the state.
//!
//! ```text
//! idle --start--> playing
//! playing --pause--> paused --resume--> playing
//! playing --next/prev (mid-playlist)--> playing
//! playing --next (last slide)--> closed
//! playing|paused --stop--> idle
//! ```
//!
//! Ordering guarantee: at most one advance timer is armed at any instant.
//! Every operation that changes index or phase cancels the pending timer
//! before arming a new one, and every arm takes a fresh generation, so a
//! stale fire (cancellation requested but not yet effective on the host
//! side) is discarded by generation mismatch. Generations are never reset,
//! which also makes a timer leaked from a previous viewing session inert.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, trace, warn};

use crate::clock::{Clock, Generation, Timer};
use crate::media::{MediaAdapter, RenderTiming};
use crate::model::{Phase, Playlist, Slide, SlideKind};
use crate::progress::{BarPhase, ProgressTrack};

/// Receives the scheduler's single outbound notification.
///
/// Emitted exactly once per session, from `next()` on the last slide. The
/// shell, not the scheduler, performs the actual modal close (and then calls
/// [`PlaybackScheduler::stop`]).
pub trait ShellSink {
    fn playlist_exhausted(&mut self);
}

impl<S: ShellSink> ShellSink for Rc<RefCell<S>> {
    fn playlist_exhausted(&mut self) {
        self.borrow_mut().playlist_exhausted();
    }
}

/// The single mutable playback state, exclusively owned by the scheduler.
#[derive(Clone, Debug)]
struct PlaybackState {
    current_index: usize,
    phase: Phase,
    /// Monotonic time at which the current playback window started (slide
    /// start or last resume).
    slide_started_at_ms: u64,
    /// Full effective duration of the current slide.
    effective_duration_ms: u64,
    /// Length of the currently armed (or frozen) playback window. Equals
    /// the effective duration at slide start and shrinks across
    /// pause/resume cycles.
    remaining_ms: u64,
    /// Mute state; applies to video slides only.
    muted: bool,
}

impl PlaybackState {
    fn new() -> Self {
        Self {
            current_index: 0,
            phase: Phase::Idle,
            slide_started_at_ms: 0,
            effective_duration_ms: 0,
            remaining_ms: 0,
            muted: false,
        }
    }
}

/// The story playback state machine.
pub struct PlaybackScheduler {
    playlist: Option<Playlist>,
    state: PlaybackState,
    media: MediaAdapter,
    progress: ProgressTrack,
    timer: Box<dyn Timer>,
    shell: Box<dyn ShellSink>,
    clock: Rc<dyn Clock>,
    generation: Generation,
}

impl PlaybackScheduler {
    pub fn new(
        media: MediaAdapter,
        progress: ProgressTrack,
        timer: Box<dyn Timer>,
        shell: Box<dyn ShellSink>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            playlist: None,
            state: PlaybackState::new(),
            media,
            progress,
            timer,
            shell,
            clock,
            generation: 0,
        }
    }

    /// Begins a viewing session: resets all state, builds the progress
    /// strip and shows slide 0.
    pub fn start(&mut self, playlist: Playlist) {
        assert!(!playlist.is_empty(), "playlist must be non-empty");
        info!("Starting story playback with {} slide(s)", playlist.len());
        self.timer.cancel();
        self.media.abandon_pending();
        self.progress.setup(playlist.len());
        self.playlist = Some(playlist);
        self.state = PlaybackState::new();
        self.show_slide(0);
    }

    /// Advances to the next slide, or closes the session when the current
    /// slide is the last one.
    pub fn next(&mut self) {
        let index = self.state.current_index;
        let (is_last, current) = match &self.playlist {
            Some(p) if self.is_active() => (p.is_last(index), p.slide(index).clone()),
            _ => {
                trace!("next() ignored in phase {:?}", self.state.phase);
                return;
            }
        };

        if is_last {
            info!("Playlist exhausted at slide {}; signalling shell to close", index);
            self.timer.cancel();
            self.media.abandon_pending();
            self.media.teardown(&current);
            self.state.phase = Phase::Closed;
            self.shell.playlist_exhausted();
        } else {
            self.show_slide(index + 1);
        }
    }

    /// Steps back one slide; at the first slide, replays it from zero
    /// instead of closing. Asymmetric with `next()`: "back" at the start
    /// replays, "forward" at the end exits.
    pub fn prev(&mut self) {
        if !self.is_active() {
            trace!("prev() ignored in phase {:?}", self.state.phase);
            return;
        }
        let index = self.state.current_index;
        self.show_slide(index.saturating_sub(1));
    }

    /// Freezes playback: cancels the advance timer, banks the remaining
    /// window, freezes the active bar and pauses a playing video. No-op
    /// unless currently playing.
    pub fn pause(&mut self) {
        if self.state.phase != Phase::Playing {
            trace!("pause() ignored in phase {:?}", self.state.phase);
            return;
        }
        self.timer.cancel();
        let now = self.clock.now_ms();
        let elapsed = now.saturating_sub(self.state.slide_started_at_ms);
        self.state.remaining_ms = self.state.remaining_ms.saturating_sub(elapsed);
        self.progress.freeze_active(self.state.current_index);
        if let Some(slide) = self.current_slide() {
            self.media.pause(&slide);
        }
        self.state.phase = Phase::Paused;
        info!(
            "Paused at slide {} with {}ms remaining",
            self.state.current_index, self.state.remaining_ms
        );
    }

    /// Resumes a paused slide: re-arms the advance timer for the banked
    /// remainder and re-animates the active bar over it. No-op unless
    /// paused.
    pub fn resume(&mut self) {
        if self.state.phase != Phase::Paused {
            trace!("resume() ignored in phase {:?}", self.state.phase);
            return;
        }
        self.timer.cancel();
        let generation = self.next_generation();
        self.state.slide_started_at_ms = self.clock.now_ms();
        self.timer.arm(self.state.remaining_ms, generation);
        self.progress.resume_active(self.state.current_index, self.state.remaining_ms);
        if let Some(slide) = self.current_slide() {
            self.media.resume(&slide);
        }
        self.state.phase = Phase::Playing;
        info!(
            "Resumed slide {} for the remaining {}ms",
            self.state.current_index, self.state.remaining_ms
        );
    }

    /// Ends the viewing session: cancels the timer, halts and rewinds
    /// video, empties every progress bar. Idempotent.
    pub fn stop(&mut self) {
        self.timer.cancel();
        self.media.abandon_pending();
        self.media.halt();
        self.progress.reset_all();
        self.state.phase = Phase::Idle;
        info!("Story playback stopped");
    }

    /// Flips the mute state and applies it to the video surface.
    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        debug!("Mute toggled: {}", self.state.muted);
        self.media.set_muted(self.state.muted);
    }

    /// The advance timer fired. Discards stale generations; otherwise
    /// behaves exactly like `next()`.
    pub fn handle_advance_deadline(&mut self, generation: Generation) {
        if generation != self.generation {
            debug!(
                "Ignoring stale advance deadline (generation {}, current {})",
                generation, self.generation
            );
            return;
        }
        if self.state.phase != Phase::Playing {
            debug!("Ignoring advance deadline in phase {:?}", self.state.phase);
            return;
        }
        trace!("Advance deadline reached for slide {}", self.state.current_index);
        self.next();
    }

    /// Video metadata resolved with the actual media length. Discards
    /// resolutions for slides that have since been torn down; otherwise
    /// starts the slide's playback window with the resolved duration.
    pub fn handle_video_metadata(&mut self, generation: Generation, duration_ms: u64) {
        if !self.media.resolve_metadata(generation) {
            return;
        }
        if generation != self.generation || self.state.phase != Phase::Advancing {
            debug!(
                "Ignoring video metadata in phase {:?} (generation {})",
                self.state.phase, generation
            );
            return;
        }
        info!(
            "Video metadata resolved for slide {}: {}ms",
            self.state.current_index, duration_ms
        );
        self.begin_slide_window(self.state.current_index, generation, duration_ms);
    }

    // --- Accessors ---

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    /// The banked playback window. Only meaningful while paused or playing.
    pub fn remaining_ms(&self) -> u64 {
        self.state.remaining_ms
    }

    pub fn effective_duration_ms(&self) -> u64 {
        self.state.effective_duration_ms
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted
    }

    /// Derived progress bar states, one per slide.
    pub fn bar_phases(&self) -> &[BarPhase] {
        self.progress.phases()
    }

    // --- Internals ---

    fn is_active(&self) -> bool {
        matches!(self.state.phase, Phase::Playing | Phase::Paused | Phase::Advancing)
    }

    fn current_slide(&self) -> Option<Slide> {
        self.playlist
            .as_ref()
            .map(|p| p.slide(self.state.current_index).clone())
    }

    fn next_generation(&mut self) -> Generation {
        self.generation += 1;
        self.generation
    }

    /// Renders the slide at `index` and arms its advance timer (or begins a
    /// metadata wait). The index must already be validated by the caller.
    fn show_slide(&mut self, index: usize) {
        let slide = match &self.playlist {
            Some(playlist) => {
                debug_assert!(index < playlist.len(), "slide index out of range");
                playlist.slide(index).clone()
            }
            None => {
                warn!("show_slide({}) with no playlist loaded", index);
                return;
            }
        };

        self.timer.cancel();
        self.media.abandon_pending();
        if self.is_active() {
            if let Some(outgoing) = self.current_slide() {
                self.media.teardown(&outgoing);
            }
        }

        let generation = self.next_generation();
        self.state.current_index = index;
        debug!("Showing slide {} ({:?})", index, slide.kind);

        let report = self.media.render(&slide, generation);
        if slide.kind == SlideKind::Video {
            // Each video starts with audio enabled unless autoplay forced
            // the muted fallback.
            self.state.muted = report.video_muted;
        }

        match report.timing {
            RenderTiming::Ready { duration_ms } => {
                self.begin_slide_window(index, generation, duration_ms);
            }
            RenderTiming::PendingMetadata => {
                debug!("Slide {} awaiting video metadata before arming the advance timer", index);
                self.state.phase = Phase::Advancing;
                self.progress.hold_waiting(index);
            }
        }
    }

    /// Starts the playback window for `index`: fresh elapsed accounting,
    /// bar animation from zero, advance timer armed for the whole duration.
    fn begin_slide_window(&mut self, index: usize, generation: Generation, duration_ms: u64) {
        self.state.effective_duration_ms = duration_ms;
        self.state.remaining_ms = duration_ms;
        self.state.slide_started_at_ms = self.clock.now_ms();
        self.progress.begin(index, duration_ms);
        self.timer.arm(duration_ms, generation);
        self.state.phase = Phase::Playing;
        trace!(
            "Slide {} playing: {}ms window armed (generation {})",
            index, duration_ms, generation
        );
    }
}
