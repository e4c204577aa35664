//! Recording doubles and a deterministic scheduler fixture shared by the
//! unit tests. Compiled only for `cfg(test)`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::clock::{ArmedDeadline, Clock, DeadlineTimer, Generation, ManualClock};
use crate::errors::MediaError;
use crate::media::{MediaAdapter, MediaSurface};
use crate::progress::{ProgressSurface, ProgressTrack};
use crate::scheduler::{PlaybackScheduler, ShellSink};

/// Initializes logging for tests; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every call a [`RecordingMediaSurface`] observed, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaCall {
    ShowImage(String),
    ShowText(String),
    BeginVideo { source: String, muted: bool },
    PauseVideo,
    ResumeVideo,
    HaltVideo,
    SetVideoMuted(bool),
}

/// Media surface double: records calls and simulates autoplay policy and
/// metadata caching.
#[derive(Debug, Default)]
pub struct RecordingMediaSurface {
    pub calls: Vec<MediaCall>,
    /// Synchronously known video duration, as if metadata were cached.
    pub cached_duration: Option<u64>,
    /// Simulates a platform that rejects autoplay with audio.
    pub reject_unmuted_autoplay: bool,
    /// Simulates a platform that rejects even muted autoplay.
    pub reject_muted_autoplay: bool,
    /// Generation of the most recent video render request.
    pub last_video_generation: Option<Generation>,
}

impl MediaSurface for RecordingMediaSurface {
    fn show_image(&mut self, source: &str) {
        self.calls.push(MediaCall::ShowImage(source.to_string()));
    }

    fn show_text(&mut self, body: &str) {
        self.calls.push(MediaCall::ShowText(body.to_string()));
    }

    fn begin_video(&mut self, source: &str, muted: bool, generation: Generation)
        -> Result<(), MediaError>
    {
        self.calls.push(MediaCall::BeginVideo { source: source.to_string(), muted });
        self.last_video_generation = Some(generation);
        if !muted && self.reject_unmuted_autoplay {
            return Err(MediaError::AutoplayBlocked("audible autoplay rejected".into()));
        }
        if muted && self.reject_muted_autoplay {
            return Err(MediaError::AutoplayBlocked("muted autoplay rejected".into()));
        }
        Ok(())
    }

    fn cached_video_duration_ms(&self) -> Option<u64> {
        self.cached_duration
    }

    fn pause_video(&mut self) {
        self.calls.push(MediaCall::PauseVideo);
    }

    fn resume_video(&mut self) {
        self.calls.push(MediaCall::ResumeVideo);
    }

    fn halt_video(&mut self) {
        self.calls.push(MediaCall::HaltVideo);
    }

    fn set_video_muted(&mut self, muted: bool) {
        self.calls.push(MediaCall::SetVideoMuted(muted));
    }
}

/// Every call a [`RecordingProgressSurface`] observed, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressCall {
    Rebuild(usize),
    Fill(usize),
    Clear(usize),
    Animate { index: usize, duration_ms: u64 },
    AnimateRemaining { index: usize, remaining_ms: u64 },
    Freeze(usize),
}

/// Progress surface double: records drawing commands.
#[derive(Debug, Default)]
pub struct RecordingProgressSurface {
    pub calls: Vec<ProgressCall>,
}

impl ProgressSurface for RecordingProgressSurface {
    fn rebuild(&mut self, count: usize) {
        self.calls.push(ProgressCall::Rebuild(count));
    }

    fn fill(&mut self, index: usize) {
        self.calls.push(ProgressCall::Fill(index));
    }

    fn clear(&mut self, index: usize) {
        self.calls.push(ProgressCall::Clear(index));
    }

    fn animate(&mut self, index: usize, duration_ms: u64) {
        self.calls.push(ProgressCall::Animate { index, duration_ms });
    }

    fn animate_remaining(&mut self, index: usize, remaining_ms: u64) {
        self.calls.push(ProgressCall::AnimateRemaining { index, remaining_ms });
    }

    fn freeze(&mut self, index: usize) {
        self.calls.push(ProgressCall::Freeze(index));
    }
}

/// Shell double: counts exhaustion signals.
#[derive(Debug, Default)]
pub struct SignalCounter {
    pub exhausted: usize,
}

impl ShellSink for SignalCounter {
    fn playlist_exhausted(&mut self) {
        self.exhausted += 1;
    }
}

/// A scheduler wired to a manual clock, a polled deadline timer and
/// recording surfaces.
pub struct Fixture {
    pub clock: Rc<ManualClock>,
    pub advance_timer: Rc<RefCell<DeadlineTimer>>,
    pub media: Rc<RefCell<RecordingMediaSurface>>,
    pub progress: Rc<RefCell<RecordingProgressSurface>>,
    pub shell: Rc<RefCell<SignalCounter>>,
    pub scheduler: PlaybackScheduler,
}

impl Fixture {
    pub fn new() -> Self {
        init_logging();
        let clock = Rc::new(ManualClock::new());
        let advance_timer = Rc::new(RefCell::new(DeadlineTimer::new(
            clock.clone() as Rc<dyn Clock>
        )));
        let media = Rc::new(RefCell::new(RecordingMediaSurface::default()));
        let progress = Rc::new(RefCell::new(RecordingProgressSurface::default()));
        let shell = Rc::new(RefCell::new(SignalCounter::default()));
        let scheduler = PlaybackScheduler::new(
            MediaAdapter::new(Box::new(media.clone())),
            ProgressTrack::new(Box::new(progress.clone())),
            Box::new(advance_timer.clone()),
            Box::new(shell.clone()),
            clock.clone() as Rc<dyn Clock>,
        );
        Self { clock, advance_timer, media, progress, shell, scheduler }
    }

    /// The pending advance deadline, if any.
    pub fn armed_advance(&self) -> Option<ArmedDeadline> {
        self.advance_timer.borrow().armed()
    }

    /// Generation of the most recent video render request.
    pub fn current_generation(&self) -> Generation {
        self.media
            .borrow()
            .last_video_generation
            .expect("no video render request recorded")
    }

    /// Discrete-event run: advances the clock to each due advance deadline
    /// in order, delivering the fire, until `target_ms` is reached.
    pub fn run_until(&mut self, target_ms: u64) {
        loop {
            let due = match self.armed_advance() {
                Some(deadline) if deadline.fire_at_ms <= target_ms => deadline,
                _ => break,
            };
            self.clock.set(due.fire_at_ms);
            // Bind before delivering: the scheduler re-borrows the timer
            // when it arms the next deadline.
            let fired = self.advance_timer.borrow_mut().due(due.fire_at_ms);
            if let Some(generation) = fired {
                self.scheduler.handle_advance_deadline(generation);
            }
        }
        self.clock.set(target_ms);
    }
}
