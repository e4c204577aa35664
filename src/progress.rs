//! Manages the per-slide progress indicator strip.
//!
//! One indicator bar exists per playlist slide. The bar states are fully
//! derived from the scheduler's current index and pause state: bars before
//! the current slide are full, the current slide's bar animates (or holds,
//! while paused), bars after it are empty. `ProgressTrack` owns that derived
//! state and pushes the matching drawing commands into the host-provided
//! [`ProgressSurface`].

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, trace};

/// Derived state of a single indicator bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarPhase {
    /// Slide not reached yet: bar empty.
    Empty,
    /// Current slide: bar filling (frozen mid-fill while paused).
    Animating,
    /// Slide already shown: bar full.
    Filled,
}

/// The host-owned strip of indicator bars.
///
/// Implementations draw into whatever the host uses for the strip (DOM
/// nodes, retained widgets, ...). All indices are in playlist order and
/// always within the count passed to the latest [`rebuild`](Self::rebuild).
pub trait ProgressSurface {
    /// Discards all bars and creates `count` empty ones.
    fn rebuild(&mut self, count: usize);

    /// Sets a bar to full width instantly.
    fn fill(&mut self, index: usize);

    /// Sets a bar to zero width instantly.
    fn clear(&mut self, index: usize);

    /// Animates a bar from zero to full width over `duration_ms`.
    fn animate(&mut self, index: usize, duration_ms: u64);

    /// Animates a bar from its current width to full over `remaining_ms`.
    fn animate_remaining(&mut self, index: usize, remaining_ms: u64);

    /// Stops a bar's animation, holding its current width.
    fn freeze(&mut self, index: usize);
}

// Progress surfaces are typically shared with the host loop; single-threaded
// model, so `Rc<RefCell<_>>` forwards.
impl<S: ProgressSurface> ProgressSurface for Rc<RefCell<S>> {
    fn rebuild(&mut self, count: usize) {
        self.borrow_mut().rebuild(count);
    }
    fn fill(&mut self, index: usize) {
        self.borrow_mut().fill(index);
    }
    fn clear(&mut self, index: usize) {
        self.borrow_mut().clear(index);
    }
    fn animate(&mut self, index: usize, duration_ms: u64) {
        self.borrow_mut().animate(index, duration_ms);
    }
    fn animate_remaining(&mut self, index: usize, remaining_ms: u64) {
        self.borrow_mut().animate_remaining(index, remaining_ms);
    }
    fn freeze(&mut self, index: usize) {
        self.borrow_mut().freeze(index);
    }
}

/// Drives the indicator strip to mirror playback progress.
pub struct ProgressTrack {
    surface: Box<dyn ProgressSurface>,
    phases: Vec<BarPhase>,
}

impl ProgressTrack {
    pub fn new(surface: Box<dyn ProgressSurface>) -> Self {
        Self { surface, phases: Vec::new() }
    }

    /// Rebuilds the strip with one empty bar per playlist slide.
    pub fn setup(&mut self, count: usize) {
        debug!("Setting up progress strip with {} bar(s)", count);
        self.surface.rebuild(count);
        self.phases = vec![BarPhase::Empty; count];
    }

    /// Recomputes every bar for a fresh start of the slide at `index`,
    /// animating its bar over `duration_ms`.
    pub fn begin(&mut self, index: usize, duration_ms: u64) {
        debug_assert!(index < self.phases.len(), "bar index out of range");
        trace!("Progress: slide {} starting, {}ms window", index, duration_ms);
        for i in 0..self.phases.len() {
            if i < index {
                self.surface.fill(i);
                self.phases[i] = BarPhase::Filled;
            } else if i == index {
                self.surface.animate(i, duration_ms);
                self.phases[i] = BarPhase::Animating;
            } else {
                self.surface.clear(i);
                self.phases[i] = BarPhase::Empty;
            }
        }
    }

    /// Recomputes every bar while the slide at `index` is still waiting for
    /// its duration (video metadata): earlier bars full, nothing animating.
    pub fn hold_waiting(&mut self, index: usize) {
        debug_assert!(index < self.phases.len(), "bar index out of range");
        trace!("Progress: slide {} awaiting duration", index);
        for i in 0..self.phases.len() {
            if i < index {
                self.surface.fill(i);
                self.phases[i] = BarPhase::Filled;
            } else {
                self.surface.clear(i);
                self.phases[i] = BarPhase::Empty;
            }
        }
    }

    /// Freezes the active bar at its currently rendered width.
    pub fn freeze_active(&mut self, index: usize) {
        debug_assert!(index < self.phases.len(), "bar index out of range");
        self.surface.freeze(index);
    }

    /// Re-animates the active bar's remaining fraction over `remaining_ms`.
    pub fn resume_active(&mut self, index: usize, remaining_ms: u64) {
        debug_assert!(index < self.phases.len(), "bar index out of range");
        self.surface.animate_remaining(index, remaining_ms);
    }

    /// Empties every bar (viewer closed or stopped).
    pub fn reset_all(&mut self) {
        trace!("Progress: resetting all bars");
        for i in 0..self.phases.len() {
            self.surface.clear(i);
            self.phases[i] = BarPhase::Empty;
        }
    }

    /// The derived state of every bar, in playlist order.
    pub fn phases(&self) -> &[BarPhase] {
        &self.phases
    }

    /// Number of bars currently in the animating phase (0 or 1).
    pub fn animating_count(&self) -> usize {
        self.phases.iter().filter(|p| **p == BarPhase::Animating).count()
    }
}
