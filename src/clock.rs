//! Injectable time sources and timer handles for deterministic playback.
//!
//! Slide advancement and gesture classification are both driven by one-shot
//! timers. To keep those flows testable without a real clock, the scheduler
//! and input controller never read wall time or set platform timeouts
//! directly: they consume a [`Clock`] for monotonic milliseconds and a
//! [`Timer`] handle for arming and cancelling the single pending deadline
//! each of them owns.
//!
//! Every armed deadline carries a [`Generation`] tag. The host echoes the tag
//! back when the deadline elapses, and the owning component discards fires
//! whose generation is no longer current. This makes a timer callback that
//! races its own cancellation (requested but not yet effective on the host
//! side) unobservable.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use log::trace;

/// Counter incremented on every slide transition or re-arm, used to
/// invalidate stale timer fires and stale media-metadata callbacks.
pub type Generation = u64;

/// A monotonic time source with millisecond resolution.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary fixed origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Production [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// A hand-driven [`Clock`] for deterministic hosts and tests.
///
/// Time only moves when [`advance`](Self::advance) or [`set`](Self::set) is
/// called, so a whole playback session can be stepped through exactly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Jumps time to an absolute value. Must not move backwards.
    pub fn set(&self, ms: u64) {
        debug_assert!(ms >= self.now.get(), "monotonic clock moved backwards");
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// A one-shot, host-scheduled timer handle.
///
/// Arming replaces any previously armed deadline, so at most one deadline is
/// ever outstanding per handle. When the deadline elapses, the host delivers
/// the fire back into the owning component (for example
/// `PlaybackScheduler::handle_advance_deadline`) together with the
/// `generation` the deadline was armed with.
pub trait Timer {
    /// Arms the timer to fire after `delay_ms`, replacing any pending
    /// deadline. The `generation` must be echoed back on fire.
    fn arm(&mut self, delay_ms: u64, generation: Generation);

    /// Cancels the pending deadline, if any.
    fn cancel(&mut self);
}

// Timer handles are typically shared between the component that arms them and
// the host loop that polls them; the crate runs single-threaded on a
// cooperative event loop, so `Rc<RefCell<_>>` is the sharing vehicle.
impl<T: Timer> Timer for Rc<RefCell<T>> {
    fn arm(&mut self, delay_ms: u64, generation: Generation) {
        self.borrow_mut().arm(delay_ms, generation);
    }

    fn cancel(&mut self) {
        self.borrow_mut().cancel();
    }
}

/// An armed deadline recorded by a [`DeadlineTimer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArmedDeadline {
    /// Absolute fire time on the timer's clock, in milliseconds.
    pub fire_at_ms: u64,
    /// Generation the deadline was armed with.
    pub generation: Generation,
}

/// A [`Timer`] for polling hosts: records the absolute deadline and lets the
/// host ask which fire, if any, is due.
///
/// This is also the timer used by the crate's own tests, driven by a
/// [`ManualClock`].
pub struct DeadlineTimer {
    clock: Rc<dyn Clock>,
    armed: Option<ArmedDeadline>,
}

impl DeadlineTimer {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self { clock, armed: None }
    }

    /// Returns the pending deadline without consuming it.
    pub fn armed(&self) -> Option<ArmedDeadline> {
        self.armed
    }

    /// Consumes and returns the pending fire if its deadline has been
    /// reached at `now_ms`.
    pub fn due(&mut self, now_ms: u64) -> Option<Generation> {
        match self.armed {
            Some(deadline) if deadline.fire_at_ms <= now_ms => {
                self.armed = None;
                Some(deadline.generation)
            }
            _ => None,
        }
    }
}

impl Timer for DeadlineTimer {
    fn arm(&mut self, delay_ms: u64, generation: Generation) {
        let fire_at_ms = self.clock.now_ms() + delay_ms;
        trace!("Arming deadline at t={}ms (generation {})", fire_at_ms, generation);
        self.armed = Some(ArmedDeadline { fire_at_ms, generation });
    }

    fn cancel(&mut self) {
        if let Some(deadline) = self.armed.take() {
            trace!(
                "Cancelled deadline at t={}ms (generation {})",
                deadline.fire_at_ms, deadline.generation
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_ms(), 0);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 250);
        clock.set(1000);
        assert_eq!(clock.now_ms(), 1000);
    }

    #[test]
    fn deadline_timer_fires_once_at_deadline() {
        let clock = Rc::new(ManualClock::new());
        let mut timer = DeadlineTimer::new(clock.clone());

        timer.arm(500, 7);
        assert_eq!(timer.due(499), None);
        assert_eq!(timer.due(500), Some(7));
        // Consumed: a second poll yields nothing.
        assert_eq!(timer.due(10_000), None);
    }

    #[test]
    fn arming_replaces_pending_deadline() {
        let clock = Rc::new(ManualClock::new());
        let mut timer = DeadlineTimer::new(clock.clone());

        timer.arm(500, 1);
        timer.arm(300, 2);
        assert_eq!(timer.armed().map(|d| d.generation), Some(2));
        assert_eq!(timer.due(500), Some(2));
    }

    #[test]
    fn cancel_discards_pending_deadline() {
        let clock = Rc::new(ManualClock::new());
        let mut timer = DeadlineTimer::new(clock.clone());

        timer.arm(500, 1);
        timer.cancel();
        assert_eq!(timer.due(10_000), None);
    }

    #[test]
    fn deadline_is_relative_to_arm_time() {
        let clock = Rc::new(ManualClock::new());
        clock.advance(3000);
        let mut timer = DeadlineTimer::new(clock.clone() as Rc<dyn Clock>);

        timer.arm(3850, 4);
        assert_eq!(timer.armed().map(|d| d.fire_at_ms), Some(6850));
    }
}
