//! The embedding seam between the host modal and the playback core.
//!
//! `StoryViewer` owns the scheduler and the gesture classifier and exposes
//! the surface the host actually talks to: the two shell lifecycle calls
//! (open and close), the raw press/release events, the mute click, and the
//! two asynchronous completions the host delivers back (the advance deadline
//! and video metadata). The modal chrome itself (focus handling, history
//! integration, the close animation) stays with the host.

use std::rc::Rc;

use log::debug;

use crate::clock::{Clock, Generation, Timer};
use crate::config::ViewerConfig;
use crate::input::{GestureAction, GestureConfig, InputController, NavSide};
use crate::media::{MediaAdapter, MediaSurface};
use crate::model::Playlist;
use crate::progress::{ProgressSurface, ProgressTrack};
use crate::scheduler::{PlaybackScheduler, ShellSink};

/// One stories viewer instance: gesture classification plus playback.
pub struct StoryViewer {
    scheduler: PlaybackScheduler,
    input: InputController,
    clock: Rc<dyn Clock>,
}

impl StoryViewer {
    /// Wires a viewer from the host-provided surfaces, timers, shell sink
    /// and clock.
    ///
    /// The two timers are independent one-shot handles: `advance_timer`
    /// fires back through [`advance_deadline_elapsed`](Self::advance_deadline_elapsed),
    /// `pause_intent_timer` through [`pause_intent_elapsed`](Self::pause_intent_elapsed).
    pub fn new(
        config: &ViewerConfig,
        media: Box<dyn MediaSurface>,
        progress: Box<dyn ProgressSurface>,
        advance_timer: Box<dyn Timer>,
        pause_intent_timer: Box<dyn Timer>,
        shell: Box<dyn ShellSink>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let scheduler = PlaybackScheduler::new(
            MediaAdapter::new(media),
            ProgressTrack::new(progress),
            advance_timer,
            shell,
            clock.clone(),
        );
        let input = InputController::new(GestureConfig::from(config), pause_intent_timer);
        Self { scheduler, input, clock }
    }

    // --- Shell lifecycle ---

    /// The modal opened: starts playback from slide 0.
    pub fn open(&mut self, playlist: Playlist) {
        self.scheduler.start(playlist);
    }

    /// The modal closed: tears playback down. Idempotent.
    pub fn close(&mut self) {
        self.scheduler.stop();
    }

    // --- Raw input events ---

    /// A press began on one side of the viewer.
    pub fn press_started(&mut self, side: NavSide) {
        let now = self.clock.now_ms();
        self.input.press(side, now);
    }

    /// The press ended (release, or the pointer left the viewer).
    pub fn press_ended(&mut self) {
        let now = self.clock.now_ms();
        let action = self.input.release(now);
        self.apply(action);
    }

    /// The pause-intent timer fired with the token it was armed with.
    pub fn pause_intent_elapsed(&mut self, token: Generation) {
        let action = self.input.pause_intent_fired(token);
        self.apply(action);
    }

    /// The mute toggle consumed a click. Deliberately bypasses gesture
    /// classification: it must never pause or navigate.
    pub fn mute_clicked(&mut self) {
        self.scheduler.toggle_mute();
    }

    // --- Host async completions ---

    /// The advance timer fired with the generation it was armed with.
    pub fn advance_deadline_elapsed(&mut self, generation: Generation) {
        self.scheduler.handle_advance_deadline(generation);
    }

    /// Video metadata resolved for the render request tagged `generation`.
    pub fn video_metadata_loaded(&mut self, generation: Generation, duration_ms: u64) {
        self.scheduler.handle_video_metadata(generation, duration_ms);
    }

    /// Read access to the playback state machine.
    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    fn apply(&mut self, action: Option<GestureAction>) {
        let Some(action) = action else { return };
        debug!("Applying gesture: {:?}", action);
        match action {
            GestureAction::Pause => self.scheduler.pause(),
            GestureAction::Resume => self.scheduler.resume(),
            GestureAction::Navigate(NavSide::Prev) => self.scheduler.prev(),
            GestureAction::Navigate(NavSide::Next) => self.scheduler.next(),
        }
    }
}
